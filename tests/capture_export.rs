//! End-to-end tests of the capture-then-export flow

use elemshot::{
    BoxRenderer, CaptureConfig, ElementSnapshot, Error, RenderOptions, Renderer, Rgba, Session, Surface,
};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};

const PAGE: &str = r##"<!DOCTYPE html>
<html>
<head>
<title>Loading PNG</title>
<style>
  .sq { width: 120px; height: 60px; background: #ffd700; border: 2px solid black; padding: 4px }
</style>
</head>
<body>
<div class="sq">Loading...</div>
<a id="download" href="#">Download</a>
</body>
</html>"##;

/// Renderer that resolves with a fixed surface once the test releases it.
struct GatedRenderer {
    gate: Mutex<Receiver<()>>,
    width: u32,
    height: u32,
}

impl Renderer for GatedRenderer {
    fn render(&self, _element: &ElementSnapshot, _options: &RenderOptions) -> elemshot::Result<Surface> {
        let gate = self.gate.lock().expect("gate lock");
        gate.recv()
            .map_err(|_| Error::RenderError("gate dropped".into()))?;
        Ok(Surface::new(self.width, self.height, Rgba::rgb(200, 10, 10)))
    }
}

fn gated(width: u32, height: u32) -> (mpsc::Sender<()>, Arc<GatedRenderer>) {
    let (tx, rx) = mpsc::channel();
    let renderer = GatedRenderer {
        gate: Mutex::new(rx),
        width,
        height,
    };
    (tx, Arc::new(renderer))
}

fn decode_png(bytes: &[u8]) -> (u32, u32, Vec<u8>) {
    let decoder = png::Decoder::new(bytes);
    let mut reader = decoder.read_info().expect("decode");
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).expect("frame");
    buf.truncate(info.buffer_size());
    (info.width, info.height, buf)
}

#[tokio::test]
async fn click_after_capture_produces_forced_png_download() {
    let (release, renderer) = gated(64, 48);
    let mut session = Session::load(PAGE, CaptureConfig::default(), renderer).expect("load");
    release.send(()).unwrap();
    session.settle().await.expect("capture");

    let download = session.click_download().expect("export");
    assert_eq!(download.filename, "image.png");
    assert!(download.href.starts_with("data:application/octet-stream;base64,"));
    assert!(!download.href.starts_with("data:image/png"));

    let (w, h, pixels) = decode_png(&download.payload().unwrap());
    assert_eq!((w, h), (64, 48));
    assert_eq!(&pixels[0..4], &[200, 10, 10, 255]);

    assert_eq!(session.page().attr("#download", "download").unwrap().as_deref(), Some("image.png"));
    assert_eq!(session.page().attr("#download", "href").unwrap(), Some(download.href));
}

#[tokio::test]
async fn click_before_capture_raises_instead_of_no_op() {
    let (release, renderer) = gated(8, 8);
    let mut session = Session::load(PAGE, CaptureConfig::default(), renderer).expect("load");

    assert!(!session.poll().unwrap());
    assert!(session.page().control("#download").unwrap().is_disabled());
    let err = session.click_download().unwrap_err();
    assert!(matches!(err, Error::SurfaceNotReady), "got {:?}", err);
    // the link was left untouched
    assert_eq!(session.page().attr("#download", "href").unwrap().as_deref(), Some("#"));
    assert_eq!(session.page().attr("#download", "download").unwrap(), None);

    release.send(()).unwrap();
    session.settle().await.unwrap();
    assert!(!session.page().control("#download").unwrap().is_disabled());
    assert!(session.click_download().is_ok());
}

#[tokio::test]
async fn repeated_clicks_are_byte_identical() {
    let mut session = Session::load(PAGE, CaptureConfig::default(), Arc::new(BoxRenderer)).unwrap();
    session.settle().await.unwrap();

    let first = session.click_download().unwrap();
    let second = session.click_download().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.payload().unwrap(), second.payload().unwrap());
}

#[tokio::test]
async fn render_failure_keeps_download_disabled() {
    let failing = |_: &ElementSnapshot, _: &RenderOptions| -> elemshot::Result<Surface> {
        Err(Error::RenderError("canvas unsupported".into()))
    };
    let mut session = Session::load(PAGE, CaptureConfig::default(), Arc::new(failing)).unwrap();

    let err = session.settle().await.unwrap_err();
    assert!(matches!(err, Error::RenderError(_)));
    assert!(session.page().control("#download").unwrap().is_disabled());
    assert!(session.page().attached_surfaces().is_empty());

    match session.click_download() {
        Err(Error::CaptureFailed(reason)) => assert!(reason.contains("canvas unsupported")),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn box_renderer_captures_the_styled_element() {
    let mut session = Session::load(PAGE, CaptureConfig::default(), Arc::new(BoxRenderer)).unwrap();
    session.settle().await.unwrap();

    let attached = &session.page().attached_surfaces()[0];
    // 120x60 content box + 4px padding + 2px border on each side
    assert_eq!((attached.width, attached.height), (132, 72));

    let (w, h, pixels) = decode_png(&session.click_download().unwrap().payload().unwrap());
    assert_eq!((w, h), (132, 72));
    let at = |x: u32, y: u32| {
        let i = ((y * w + x) * 4) as usize;
        [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
    };
    assert_eq!(at(0, 0), [0, 0, 0, 255], "border");
    assert_eq!(at(100, 50), [0xff, 0xd7, 0x00, 255], "background");
}

#[tokio::test]
async fn custom_selectors_filename_and_scale() {
    let html = r##"<section id="card" style="width:10px;height:10px;background:blue"></section>
        <button class="save">Save</button>"##;
    let config = CaptureConfig {
        source_selector: "#card".into(),
        trigger_selector: "button.save".into(),
        filename: "card.png".into(),
        scale: 3,
        ..Default::default()
    };
    let mut session = Session::load(html, config, Arc::new(BoxRenderer)).unwrap();
    session.settle().await.unwrap();

    let download = session.click_download().unwrap();
    assert_eq!(download.filename, "card.png");
    let (w, h, _) = decode_png(&download.payload().unwrap());
    assert_eq!((w, h), (30, 30));
}

#[test]
fn missing_source_element_fails_on_load() {
    let html = r##"<a id="download" href="#">Download</a>"##;
    let err = Session::load(html, CaptureConfig::default(), Arc::new(BoxRenderer)).err();
    assert!(matches!(err, Some(Error::ElementNotFound(ref s)) if s == ".sq"));
}

#[tokio::test]
async fn oversized_element_fails_capture_without_aborting() {
    let html = r##"<div class="sq" style="width:1e10px;height:1e10px;background:red"></div>
        <a id="download" href="#">Download</a>"##;
    let mut session = Session::load(html, CaptureConfig::default(), Arc::new(BoxRenderer)).unwrap();

    match session.settle().await {
        Err(Error::RenderError(msg)) => assert!(msg.contains("exceeds"), "got {}", msg),
        other => panic!("unexpected {:?}", other),
    }
    assert!(session.page().control("#download").unwrap().is_disabled());
    assert!(matches!(session.click_download(), Err(Error::CaptureFailed(_))));
}

#[test]
fn scale_beyond_the_limit_is_rejected_on_load() {
    let config = CaptureConfig {
        scale: 50_000_000,
        ..Default::default()
    };
    let err = Session::load(PAGE, config, Arc::new(BoxRenderer)).err();
    assert!(matches!(err, Some(Error::ConfigError(_))));
}

#[tokio::test]
async fn renderer_panic_reaches_the_failed_click() {
    let panicking = |_: &ElementSnapshot, _: &RenderOptions| -> elemshot::Result<Surface> {
        panic!("font table missing")
    };
    let mut session = Session::load(PAGE, CaptureConfig::default(), Arc::new(panicking)).unwrap();

    let err = session.settle().await.unwrap_err();
    assert!(err.to_string().contains("font table missing"), "got {}", err);
    assert!(session.page().control("#download").unwrap().is_disabled());

    match session.click_download() {
        Err(Error::CaptureFailed(reason)) => assert!(reason.contains("font table missing"), "got {}", reason),
        other => panic!("unexpected {:?}", other),
    }
}
