//! Capture the `.sq` element of a small page and save it like the download link would.
//!
//! cargo run --example capture_page

use elemshot::{BoxRenderer, CaptureConfig, Session};
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let html = r##"<html><head><title>Loading PNG</title>
<style>
  .sq { width: 160px; height: 160px; background: #1e90ff; border: 4px solid #0b3d91; padding: 8px; color: white }
</style></head>
<body>
  <div class="sq">Loading...</div>
  <a id="download" href="#">Download</a>
</body></html>"##;

    let mut session = Session::load(html, CaptureConfig::default(), Arc::new(BoxRenderer))?;

    // Clicking right away fails: the capture has not completed yet.
    if !session.poll()? {
        match session.click_download() {
            Ok(_) => println!("capture finished before the first click"),
            Err(e) => println!("early click: {}", e),
        }
    }

    session.settle().await?;
    let download = session.click_download()?;
    println!(
        "download=\"{}\" href=\"{}...\" ({} chars)",
        download.filename,
        &download.href[..48],
        download.href.len()
    );

    std::fs::write(&download.filename, download.payload()?)?;
    println!("saved {}", download.filename);
    Ok(())
}
