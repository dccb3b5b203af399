//! End-to-end pipeline tests against an in-memory engine.

use mcpship::engine::BuildEngine;
use mcpship::error::{EngineError, ManifestError, ShipError, Stage};
use mcpship::pipeline::{Pipeline, PipelineConfig};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use zip::write::SimpleFileOptions;

fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer
            .write_all(contents.as_bytes())
            .expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Build { context: PathBuf, tag: String },
    Export { tag: String, path: PathBuf },
}

/// Records engine calls and fabricates an artifact file on export.
#[derive(Default)]
struct MockEngine {
    calls: Mutex<Vec<Call>>,
}

impl MockEngine {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock").clone()
    }
}

impl BuildEngine for MockEngine {
    async fn availability(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn build(&self, context_dir: &Path, tag: &str) -> Result<(), EngineError> {
        self.calls.lock().expect("lock").push(Call::Build {
            context: context_dir.to_path_buf(),
            tag: tag.to_string(),
        });
        Ok(())
    }

    async fn export(&self, tag: &str, output_path: &Path) -> Result<(), EngineError> {
        self.calls.lock().expect("lock").push(Call::Export {
            tag: tag.to_string(),
            path: output_path.to_path_buf(),
        });
        std::fs::write(output_path, b"image archive").expect("write artifact");
        Ok(())
    }

    async fn load(&self, _archive_path: &Path) -> Result<String, EngineError> {
        Ok("Loaded image: mock:latest".to_string())
    }
}

/// Fails every build with a fixed engine log.
struct FailingEngine;

impl BuildEngine for FailingEngine {
    async fn availability(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn build(&self, _context_dir: &Path, tag: &str) -> Result<(), EngineError> {
        Err(EngineError::BuildFailed {
            tag: tag.to_string(),
            log: "Step 3/6 : RUN npm install\nnpm ERR! code ENETUNREACH".to_string(),
        })
    }

    async fn export(&self, _tag: &str, _output_path: &Path) -> Result<(), EngineError> {
        panic!("export must not run after a failed build");
    }

    async fn load(&self, _archive_path: &Path) -> Result<String, EngineError> {
        panic!("load is not part of the build pipeline");
    }
}

fn test_config(root: &Path) -> PipelineConfig {
    PipelineConfig {
        extract_root: root.join("extracted"),
        output_root: root.join("output"),
    }
}

const NODE_MANIFEST: &str = r#"{
  "name": "Test-App",
  "version": "1.0.0",
  "description": "Test application",
  "keywords": ["test", "mcp"],
  "repository": {"type": "git", "url": "https://github.com/test/test-app"},
  "run": {"command": "node", "args": ["index.js"], "port": 3000}
}"#;

#[tokio::test]
async fn end_to_end_flattened_archive() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    let pipeline = Pipeline::new(config.clone(), MockEngine::default());

    let archive = zip_bytes(&[
        ("test-app/mcp.json", NODE_MANIFEST),
        ("test-app/index.js", "console.log('Hello World');"),
        ("test-app/package.json", "{}"),
    ]);

    let result = pipeline
        .run(&archive, "test-app.zip")
        .await
        .expect("pipeline run");

    assert!(result.success);
    assert_eq!(result.image_tag, "test-app");
    assert_eq!(result.manifest.name, "Test-App");
    assert!(result.message.contains("test-app.zip"));
    assert!(result.message.contains("test-app.tar"));

    // Flattened: manifest lives at the working-directory root.
    let work_dir = config.extract_root.join("test-app");
    assert!(work_dir.join("mcp.json").is_file());
    assert!(!work_dir.join("test-app").exists());

    let recipe = std::fs::read_to_string(work_dir.join("Dockerfile")).expect("read recipe");
    assert!(recipe.contains("FROM node:18-slim"));
    assert!(recipe.contains("RUN npm install"));
    assert!(recipe.contains("EXPOSE 3000"));
    assert!(recipe.contains("CMD [\"node\", \"index.js\"]"));

    assert!(result.extract_dir.is_absolute());
    assert!(result.recipe_path.is_absolute());
    assert!(result.artifact_path.is_absolute());
    assert!(result.artifact_path.ends_with("output/test-app.tar"));
    assert!(result.artifact_path.is_file());
}

#[tokio::test]
async fn nested_manifest_dir_becomes_build_context() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    let engine = std::sync::Arc::new(MockEngine::default());
    let pipeline = Pipeline::new(config.clone(), ArcEngine(engine.clone()));

    // Mixed top-level entries: no flattening, manifest sits one level down.
    let archive = zip_bytes(&[
        ("README.md", "docs"),
        ("service/mcp.json", r#"{"name":"svc","run":{"command":"python3","args":["app.py"],"port":5000}}"#),
        ("service/app.py", "print('hi')"),
        ("service/requirements.txt", "flask\n"),
    ]);

    pipeline.run(&archive, "bundle.zip").await.expect("pipeline run");

    let manifest_dir = config.extract_root.join("bundle").join("service");
    assert!(manifest_dir.join("Dockerfile").is_file());

    let recipe = std::fs::read_to_string(manifest_dir.join("Dockerfile")).expect("read recipe");
    assert!(recipe.contains("FROM python:3.11-slim"));
    assert!(recipe.contains("RUN pip install --no-cache-dir -r requirements.txt"));

    let calls = engine.calls();
    assert_eq!(
        calls[0],
        Call::Build {
            context: manifest_dir.clone(),
            tag: "svc".to_string(),
        }
    );
    assert_eq!(
        calls[1],
        Call::Export {
            tag: "svc".to_string(),
            path: config.output_root.join("bundle.tar"),
        }
    );
}

/// Shares a mock engine with the test body after the pipeline takes ownership.
struct ArcEngine(std::sync::Arc<MockEngine>);

impl BuildEngine for ArcEngine {
    async fn availability(&self) -> Result<(), EngineError> {
        self.0.availability().await
    }
    async fn build(&self, context_dir: &Path, tag: &str) -> Result<(), EngineError> {
        self.0.build(context_dir, tag).await
    }
    async fn export(&self, tag: &str, output_path: &Path) -> Result<(), EngineError> {
        self.0.export(tag, output_path).await
    }
    async fn load(&self, archive_path: &Path) -> Result<String, EngineError> {
        self.0.load(archive_path).await
    }
}

#[tokio::test]
async fn missing_manifest_fails_in_locating_and_writes_no_recipe() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    let pipeline = Pipeline::new(config.clone(), MockEngine::default());

    let archive = zip_bytes(&[("index.js", "console.log(1);")]);
    let err = pipeline
        .run(&archive, "plain.zip")
        .await
        .expect_err("must fail");

    assert_eq!(err.stage(), Some(Stage::Locating));
    assert!(matches!(
        err,
        ShipError::Stage { ref source, .. }
            if matches!(**source, ShipError::Manifest(ManifestError::NotFound { .. }))
    ));

    let recipes: Vec<_> = walkdir::WalkDir::new(&config.extract_root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_str() == Some("Dockerfile"))
        .collect();
    assert!(recipes.is_empty());
    assert!(!config.output_root.exists());
}

#[tokio::test]
async fn invalid_manifest_names_missing_field() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = Pipeline::new(test_config(dir.path()), MockEngine::default());

    let archive = zip_bytes(&[("mcp.json", r#"{"run":{"command":"node"}}"#)]);
    let err = pipeline
        .run(&archive, "unnamed.zip")
        .await
        .expect_err("must fail");

    assert_eq!(err.stage(), Some(Stage::Locating));
    assert!(err.to_string().contains("'name'"));
}

#[tokio::test]
async fn build_failure_surfaces_engine_log_verbatim() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = Pipeline::new(test_config(dir.path()), FailingEngine);

    let archive = zip_bytes(&[("mcp.json", r#"{"name":"demo","run":{"command":"node"}}"#)]);
    let err = pipeline
        .run(&archive, "demo.zip")
        .await
        .expect_err("must fail");

    assert_eq!(err.stage(), Some(Stage::Building));
    assert!(err.to_string().contains("npm ERR! code ENETUNREACH"));
}

#[tokio::test]
async fn stale_working_directory_is_cleaned_before_extraction() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    let work_dir = config.extract_root.join("demo");
    std::fs::create_dir_all(&work_dir).expect("seed work dir");
    std::fs::write(work_dir.join("stale.txt"), b"left over").expect("seed stale file");

    let pipeline = Pipeline::new(config, MockEngine::default());
    let archive = zip_bytes(&[("mcp.json", r#"{"name":"demo","run":{"command":"node"}}"#)]);
    pipeline.run(&archive, "demo.zip").await.expect("pipeline run");

    assert!(!work_dir.join("stale.txt").exists());
    assert!(work_dir.join("mcp.json").is_file());
}
