//! `pageguard manifest`: print the browser's native-messaging host manifest.

use crate::cli::output::{self, Styled};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Host name the extension passes to `connectNative`.
pub const HOST_NAME: &str = "com.pageguard.host";

/// Build the manifest JSON for `extension_id`, pointing at `binary`.
pub fn host_manifest(extension_id: &str, binary: &Path) -> serde_json::Value {
    serde_json::json!({
        "name": HOST_NAME,
        "description": "PageGuard harmful content scanner",
        "path": binary.display().to_string(),
        "type": "stdio",
        "allowed_origins": [format!("chrome-extension://{extension_id}/")],
    })
}

fn valid_extension_id(id: &str) -> bool {
    id.len() == 32 && id.chars().all(|c| ('a'..='p').contains(&c))
}

/// Print the manifest, or write it to `output`.
pub async fn run(extension_id: &str, path: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    if !valid_extension_id(extension_id) {
        bail!("'{extension_id}' is not a valid extension id (32 characters a-p)");
    }
    let binary = match path {
        Some(p) => p,
        None => std::env::current_exe().context("locating the pageguard binary")?,
    };
    let manifest = host_manifest(extension_id, &binary);

    match output {
        Some(file) => {
            if let Some(parent) = file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&file, serde_json::to_string_pretty(&manifest)?)
                .with_context(|| format!("writing {}", file.display()))?;
            if output::is_json() {
                output::print_json(&serde_json::json!({ "written": file.display().to_string() }));
            } else if !output::is_quiet() {
                let s = Styled::new();
                eprintln!("  {} Wrote host manifest to {}", s.ok_sym(), file.display());
            }
        }
        None => output::print_json(&manifest),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_fields() {
        let id = "abcdefghijklmnopabcdefghijklmnop";
        let m = host_manifest(id, Path::new("/usr/local/bin/pageguard"));
        assert_eq!(m["name"], HOST_NAME);
        assert_eq!(m["type"], "stdio");
        assert_eq!(m["path"], "/usr/local/bin/pageguard");
        assert_eq!(
            m["allowed_origins"][0],
            format!("chrome-extension://{id}/")
        );
    }

    #[test]
    fn test_extension_id_validation() {
        assert!(valid_extension_id("abcdefghijklmnopabcdefghijklmnop"));
        assert!(!valid_extension_id("short"));
        assert!(!valid_extension_id("zbcdefghijklmnopabcdefghijklmnop"));
    }
}
