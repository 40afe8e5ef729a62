//! End-to-end session flows against a stub inference server.

mod common;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{StubResponse, StubServer};
use edgequake_translate::{
    ConnectionState, ErrorKind, TranslationSession, TranslatorConfig, UploadedFile,
};
use std::time::Duration;

fn config_for(server: &StubServer) -> TranslatorConfig {
    TranslatorConfig::builder()
        .base_url(server.base_url())
        .request_timeout_secs(5)
        .build()
        .unwrap()
}

#[tokio::test]
async fn text_file_to_turkish_and_download() {
    let server = StubServer::ollama("Merhaba dünya").await;
    let session = TranslationSession::start(config_for(&server)).unwrap();

    let file = UploadedFile::new(b"Hello world".to_vec(), "text/plain", "hello.txt");
    assert_eq!(session.load_document(&file).await.unwrap(), "Hello world");
    assert_eq!(session.snapshot().source_text, "Hello world");

    let translated = session.translate().await.unwrap();
    assert_eq!(translated, "Merhaba dünya");

    let generate = server.requests_to("/api/generate");
    assert_eq!(generate.len(), 1);
    let body = generate[0].json();
    assert!(body.get("images").is_none());
    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.contains("from auto-detect to Türkçe"), "{prompt}");
    assert!(prompt.ends_with("Hello world"));

    let state = session.snapshot();
    assert_eq!(state.translated_text, "Merhaba dünya");
    assert!(!state.busy);

    let dir = tempfile::tempdir().unwrap();
    let path = session.save_translation(dir.path()).unwrap();
    let name = path.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("translation_auto_to_tr_"), "{name}");
    assert!(name.ends_with(".txt"));
    // translation_auto_to_tr_YYYY-MM-DDTHH-MM-SS.txt
    assert_eq!(name.len(), "translation_auto_to_tr_".len() + 19 + 4);
    assert_eq!(std::fs::read(&path).unwrap(), "Merhaba dünya".as_bytes());

    session.shutdown().await;
}

#[tokio::test]
async fn unsupported_types_make_no_requests() {
    let server = StubServer::ollama("unused").await;
    let session = TranslationSession::start(config_for(&server)).unwrap();

    let csv = UploadedFile::new(b"a,b\n1,2".to_vec(), "text/csv", "data.csv");
    let err = session.load_document(&csv).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    let err = session.ocr_file(&csv).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);

    assert!(server.requests_to("/api/generate").is_empty());
    assert!(!session.is_busy());
    assert_eq!(session.snapshot().source_text, "");
}

#[tokio::test]
async fn empty_source_is_rejected_locally() {
    let server = StubServer::ollama("unused").await;
    let session = TranslationSession::start(config_for(&server)).unwrap();

    session.set_source_text("  \n\t ");
    let err = session.translate().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptySourceText);
    assert!(server.requests_to("/api/generate").is_empty());
}

#[tokio::test]
async fn image_is_normalised_before_ocr() {
    let server = StubServer::ollama("SCANNED TEXT").await;
    let session = TranslationSession::start(config_for(&server)).unwrap();

    let file = UploadedFile::new(common::png(2048, 1024), "image/png", "scan.png");
    assert_eq!(session.ocr_file(&file).await.unwrap(), "SCANNED TEXT");
    assert_eq!(session.snapshot().source_text, "SCANNED TEXT");

    let req = &server.requests_to("/api/generate")[0];
    let sent = req.image_bytes().unwrap();
    assert_eq!(image::guess_format(&sent).unwrap(), image::ImageFormat::Jpeg);
    let img = image::load_from_memory(&sent).unwrap();
    assert_eq!((img.width(), img.height()), (1024, 512));
    assert_eq!(
        req.json()["prompt"],
        edgequake_translate::prompts::DEFAULT_OCR_PROMPT
    );
}

#[tokio::test]
async fn passthrough_sends_original_bytes() {
    let server = StubServer::ollama("text").await;
    let config = TranslatorConfig::builder()
        .base_url(server.base_url())
        .normalize_images(false)
        .build()
        .unwrap();
    let session = TranslationSession::start(config).unwrap();

    let original = common::png(64, 32);
    let file = UploadedFile::new(original.clone(), "image/png", "tiny.png");
    session.ocr_file(&file).await.unwrap();

    let body = server.requests_to("/api/generate")[0].json();
    assert_eq!(body["images"][0], STANDARD.encode(&original));
}

#[tokio::test]
async fn undecodable_image_is_decode_error() {
    let server = StubServer::ollama("unused").await;
    let session = TranslationSession::start(config_for(&server)).unwrap();

    let file = UploadedFile::new(b"not really a png".to_vec(), "image/png", "bad.png");
    let err = session.ocr_file(&file).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeError);
    assert!(server.requests_to("/api/generate").is_empty());
}

#[tokio::test]
async fn later_resolving_upload_wins_the_buffer() {
    let server = StubServer::start(|req| match req.path.as_str() {
        "/api/generate" => match req.image_bytes().as_deref() {
            Some(b"slow") => {
                StubResponse::generated("from slow upload").with_delay(Duration::from_millis(400))
            }
            _ => StubResponse::generated("from fast upload").with_delay(Duration::from_millis(50)),
        },
        _ => StubResponse::raw(200, "{}"),
    })
    .await;
    let config = TranslatorConfig::builder()
        .base_url(server.base_url())
        .normalize_images(false)
        .build()
        .unwrap();
    let session = TranslationSession::start(config).unwrap();

    let slow = UploadedFile::new(b"slow".to_vec(), "image/png", "a.png");
    let fast = UploadedFile::new(b"fast".to_vec(), "image/png", "b.png");

    // The slow upload starts first but resolves last.
    let (a, b) = tokio::join!(session.ocr_file(&slow), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let out = session.ocr_file(&fast).await;
        // The first completion clears the shared flag while the slow one runs.
        assert!(!session.is_busy());
        out
    });
    assert_eq!(a.unwrap(), "from slow upload");
    assert_eq!(b.unwrap(), "from fast upload");
    assert_eq!(session.snapshot().source_text, "from slow upload");
    assert!(!session.is_busy());
}

#[tokio::test]
async fn languages_are_sent_as_display_names() {
    let server = StubServer::ollama("Bonjour").await;
    let session = TranslationSession::start(config_for(&server)).unwrap();

    session.set_languages("en", "fr").unwrap();
    session.set_source_text("Hello");
    session.translate().await.unwrap();

    let prompt = server.requests_to("/api/generate")[0].json()["prompt"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(prompt.contains("from English to Français"));

    let err = session.set_languages("en", "auto").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    assert_eq!(session.snapshot().target_lang, "fr");
}

#[tokio::test]
async fn inference_failure_keeps_previous_buffers() {
    let server = StubServer::start(|req| match req.path.as_str() {
        "/api/generate" => StubResponse::raw(500, "boom"),
        _ => StubResponse::raw(200, "{}"),
    })
    .await;
    let session = TranslationSession::start(config_for(&server)).unwrap();

    session.set_source_text("keep me");
    let err = session.translate().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InferenceUnavailable);
    let state = session.snapshot();
    assert_eq!(state.source_text, "keep me");
    assert_eq!(state.translated_text, "");
    assert!(!state.busy);
}

#[tokio::test]
async fn connection_state_follows_server() {
    let server = StubServer::ollama("").await;
    let session = TranslationSession::start(config_for(&server)).unwrap();

    assert_eq!(session.recheck_connection().await, ConnectionState::Connected);
    assert_eq!(session.connection_state(), ConnectionState::Connected);

    server.stop();
    assert_eq!(
        session.recheck_connection().await,
        ConnectionState::Disconnected
    );
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);

    session.shutdown().await;
    assert!(session.connection_updates().is_none());
    assert_eq!(session.connection_state(), ConnectionState::Unknown);
}

#[tokio::test]
async fn pdf_first_page_is_ocrd() {
    if !common::pdfium_available().await {
        return;
    }
    let server = StubServer::ollama("page one").await;
    let session = TranslationSession::start(config_for(&server)).unwrap();

    let file = UploadedFile::new(common::blank_pdf(3), "application/pdf", "three.pdf");
    assert_eq!(session.ocr_file(&file).await.unwrap(), "page one");

    let generate = server.requests_to("/api/generate");
    assert_eq!(generate.len(), 1);
    let img = image::load_from_memory(&generate[0].image_bytes().unwrap()).unwrap();
    assert_eq!((img.width(), img.height()), (400, 200));
}

#[tokio::test]
async fn pdf_without_pages_is_render_error() {
    if !common::pdfium_available().await {
        return;
    }
    let server = StubServer::ollama("unused").await;
    let session = TranslationSession::start(config_for(&server)).unwrap();

    let file = UploadedFile::new(common::blank_pdf(0), "application/pdf", "empty.pdf");
    let err = session.ocr_file(&file).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RenderError);
    assert!(server.requests_to("/api/generate").is_empty());
    assert!(!session.is_busy());
}

#[tokio::test]
async fn pdf_without_literals_is_extraction_failed() {
    let server = StubServer::ollama("unused").await;
    let session = TranslationSession::start(config_for(&server)).unwrap();

    let file = UploadedFile::new(common::blank_pdf(1), "application/pdf", "blank.pdf");
    let err = session.load_document(&file).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
}

#[tokio::test]
async fn files_from_disk_are_typed_by_extension() {
    let server = StubServer::ollama("Hallo Welt").await;
    let session = TranslationSession::start(config_for(&server)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.txt");
    std::fs::write(&path, "Hello world").unwrap();

    let file = UploadedFile::from_path(&path).await.unwrap();
    assert_eq!(file.media_type(), "text/plain");
    session.load_document(&file).await.unwrap();
    session.set_languages("en", "de").unwrap();
    assert_eq!(session.translate().await.unwrap(), "Hallo Welt");
}
