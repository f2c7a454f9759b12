//! Writing a [`RunResult`] to disk.
//!
//! Existing files are left alone unless `force` is set; files whose content
//! already matches are never rewritten. Module index files (`mod.rs`) are
//! ordinary artifacts of the run and follow the same rules.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::orchestrator::RunResult;
use super::paths::Manifest;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// What [`write_artifacts`] did with each artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

/// Write every artifact of `result`.
///
/// With `dry_run` nothing touches the filesystem; the summary lists what
/// would have been written.
///
/// # Errors
///
/// Returns an error if an existing file cannot be read, or a directory or
/// file cannot be created.
pub fn write_artifacts(result: &RunResult, force: bool, dry_run: bool) -> anyhow::Result<WriteSummary> {
    let mut summary = WriteSummary::default();
    for artifact in &result.artifacts {
        let path = &artifact.path;
        if path.exists() {
            let current = fs::read_to_string(path)
                .with_context(|| format!("Failed to read existing {}", path.display()))?;
            if current == artifact.content {
                debug!(path = %path.display(), "unchanged");
                summary.unchanged.push(path.clone());
                continue;
            }
            if !force {
                println!("⚠️  Skipping existing file: {path:?}");
                summary.skipped.push(path.clone());
                continue;
            }
        }
        if dry_run {
            println!("📝 Would write {} → {path:?}", artifact.logical_id);
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
            fs::write(path, &artifact.content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Generated {} → {path:?}", artifact.logical_id);
        }
        summary.written.push(path.clone());
    }
    Ok(summary)
}

/// Write `manifest.json` into `root`.
pub fn write_manifest(manifest: &Manifest, root: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(root).with_context(|| format!("Failed to create directory {}", root.display()))?;
    let path = root.join(MANIFEST_FILE_NAME);
    let json = manifest.to_json().context("Failed to serialize manifest")?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✅ Wrote manifest → {path:?}");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisCache, ModelAnalysis};
    use crate::generator::orchestrator::{
        ArtifactFile, FnLayer, LayerGenerator, Orchestrator, RunOptions,
    };
    use crate::generator::paths::OutputLayout;
    use crate::schema::{parse_schema_str, Model, SchemaFormat};
    use serde_json::json;

    fn run(root: &Path) -> RunResult {
        let doc = json!({"models": [
            {"name": "User", "fields": [{"name": "id", "kind": "scalar", "type": "Int", "isId": true}]}
        ]});
        let schema = parse_schema_str(&doc.to_string(), SchemaFormat::Json).unwrap();
        let layers: Vec<Box<dyn LayerGenerator<()>>> = vec![Box::new(FnLayer::new(
            "dto",
            |model: &Model, _: &ModelAnalysis, _: &()| -> anyhow::Result<Vec<ArtifactFile>> {
                Ok(vec![ArtifactFile::new(
                    format!("dto/{}", model.name.to_lowercase()),
                    "pub struct User;\n",
                )])
            },
        ))];
        Orchestrator::new(OutputLayout::new(root))
            .with_options(RunOptions {
                module_index: true,
                ..RunOptions::default()
            })
            .run(&schema, &layers, &(), &mut AnalysisCache::new())
            .unwrap()
    }

    #[test]
    fn test_write_skip_and_force() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(dir.path());
        let target = dir.path().join("dto").join("user.rs");

        let dry = write_artifacts(&result, false, true).unwrap();
        assert_eq!(dry.written.len(), 3);
        assert!(dry.written.contains(&target));
        assert!(!target.exists());

        let first = write_artifacts(&result, false, false).unwrap();
        assert_eq!(first.written.len(), 3);
        assert_eq!(fs::read_to_string(&target).unwrap(), "pub struct User;\n");

        let again = write_artifacts(&result, false, false).unwrap();
        assert_eq!(again.unchanged.len(), 3);
        assert!(again.written.is_empty());

        fs::write(&target, "// hand edited\n").unwrap();
        let kept = write_artifacts(&result, false, false).unwrap();
        assert_eq!(kept.skipped, vec![target.clone()]);
        assert_eq!(fs::read_to_string(&target).unwrap(), "// hand edited\n");

        let forced = write_artifacts(&result, true, false).unwrap();
        assert_eq!(forced.written, vec![target.clone()]);
        assert_eq!(fs::read_to_string(&target).unwrap(), "pub struct User;\n");
    }

    #[test]
    fn test_hand_edited_mod_file_is_kept_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(dir.path());
        let dto_mod = dir.path().join("dto").join("mod.rs");
        write_artifacts(&result, false, false).unwrap();
        assert!(fs::read_to_string(&dto_mod).unwrap().contains("pub mod user;"));
        assert!(fs::read_to_string(dir.path().join("mod.rs")).unwrap().contains("pub mod dto;"));

        fs::write(&dto_mod, "pub mod user;\npub mod extra;\n").unwrap();
        let kept = write_artifacts(&result, false, false).unwrap();
        assert_eq!(kept.skipped, vec![dto_mod.clone()]);
        assert!(fs::read_to_string(&dto_mod).unwrap().contains("pub mod extra;"));

        write_artifacts(&result, true, false).unwrap();
        assert!(!fs::read_to_string(&dto_mod).unwrap().contains("pub mod extra;"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_existing_file_is_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let result = run(dir.path());
        write_artifacts(&result, false, false).unwrap();
        let target = dir.path().join("dto").join("user.rs");
        fs::write(&target, "// hand edited\n").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_to_string(&target).is_ok() {
            // Running as root; permissions are not enforced.
            return;
        }

        let err = write_artifacts(&result, true, false).unwrap_err();
        assert!(err.to_string().contains("Failed to read existing"));
        fs::set_permissions(&target, fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "// hand edited\n");
    }

    #[test]
    fn test_manifest_lists_mod_files() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(dir.path());
        let path = write_manifest(&result.manifest, dir.path()).unwrap();
        let loaded = Manifest::from_json(&fs::read_to_string(path).unwrap()).unwrap();
        assert!(loaded.deterministic_eq(&result.manifest));
        assert!(loaded.path_map.contains_key("dto/user"));
        assert_eq!(
            loaded.path_map["dto/mod"].absolute_path,
            dir.path().join("dto").join("mod.rs")
        );
        assert!(loaded.path_map.contains_key("mod"));
    }
}
