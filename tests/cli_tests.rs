use std::fs;
use tempfile::tempdir;
use tokio::process::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_media-localizer"))
}

#[tokio::test]
async fn test_missing_config_exits_with_one() {
    let dir = tempdir().unwrap();

    let output = binary().current_dir(dir.path()).output().await.unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load configuration"), "stderr: {}", stderr);
}

#[tokio::test]
async fn test_help_exits_successfully() {
    let output = binary().arg("--help").output().await.unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("--config"));
}

#[tokio::test]
async fn test_run_with_default_config_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hero.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let remote = format!("{}/hero.jpg", server.uri());
    fs::write(dir.path().join("index.html"), format!(r#"<img id="hero" src="{}">"#, remote)).unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "htmlPath = 'index.html'\nmediaDir = 'medias'\nmediaSrcSelector = '#hero'\n",
    )
    .unwrap();

    let output = binary().current_dir(dir.path()).output().await.unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(fs::read(dir.path().join("medias/media_0.jpg")).unwrap(), b"jpeg");
    assert_eq!(
        fs::read_to_string(dir.path().join("index.html")).unwrap(),
        r#"<img id="hero" src="./medias/media_0.jpg">"#
    );
}

#[tokio::test]
async fn test_failed_download_exits_with_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let html = format!(
        r#"<video src="{uri}/a.mp4"></video><video src="{uri}/b.mp4"></video>"#,
        uri = server.uri()
    );
    fs::write(dir.path().join("index.html"), &html).unwrap();
    fs::write(
        dir.path().join("site.json"),
        r#"{"htmlPath": "index.html", "mediaDir": "medias", "mediaSrcSelector": "video"}"#,
    )
    .unwrap();

    let output = binary()
        .current_dir(dir.path())
        .args(["-c", "site.json"])
        .output()
        .await
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(fs::read_to_string(dir.path().join("index.html")).unwrap(), html);
    assert!(!dir.path().join("medias/media_0.mp4").exists());
    assert!(!dir.path().join("medias/media_1.mp4").exists());
}

#[tokio::test]
async fn test_unknown_flag_exits_with_one() {
    let output = binary().arg("--bogus").output().await.unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--bogus"));
}

#[tokio::test]
async fn test_stray_argument_exits_with_one() {
    let output = binary().arg("index.html").output().await.unwrap();

    assert_eq!(output.status.code(), Some(1));
}
