use anyhow::Result;
use std::path::PathBuf;

fn exe_name(name: &str) -> String {
    if cfg!(windows) && !name.ends_with(".exe") {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// Candidate Android SDK roots: env overrides first, then the usual install locations
fn sdk_roots() -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
        .iter()
        .filter_map(|k| std::env::var_os(k))
        .map(PathBuf::from)
        .collect();

    if let Some(home) = dirs::home_dir() {
        roots.push(home.join("Android").join("Sdk"));
        roots.push(home.join("Library").join("Android").join("sdk"));
    }
    if let Some(local) = dirs::data_local_dir() {
        roots.push(local.join("Android").join("Sdk"));
    }
    roots
}

/// Locate `adb`, preferring the SDK platform-tools over the system PATH
pub fn find_adb() -> Result<PathBuf> {
    let name = exe_name("adb");
    let mut checked_paths = Vec::new();

    for root in sdk_roots() {
        let candidate = root.join("platform-tools").join(&name);
        if candidate.exists() {
            return Ok(candidate);
        }
        checked_paths.push(candidate.display().to_string());
    }

    if let Ok(path) = which::which(&name) {
        return Ok(path);
    }

    Err(anyhow::anyhow!(
        "Could not find 'adb'. Checked paths:\n{}\nand the system PATH",
        checked_paths.join("\n")
    ))
}

/// Locate an executable on the system PATH, falling back to the bare name
pub fn find_binary(name: &str) -> PathBuf {
    which::which(name).unwrap_or_else(|_| PathBuf::from(name))
}
