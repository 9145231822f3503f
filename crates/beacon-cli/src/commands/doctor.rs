use anyhow::{Result, bail};
use beacon_browser::ChromeFinder;
use beacon_core::input::load_targets;
use console::style;
use std::path::{Path, PathBuf};

/// Preflight checks for a batch run: browser binary, target list, and
/// output directory. Prints one line per check and fails if any check does.
pub fn execute(urls: &Path, chrome_path: Option<PathBuf>, output_dir: &Path) -> Result<()> {
    println!("\n{}", style("Beacon Doctor").bold().cyan());
    let mut failures: Vec<String> = Vec::new();

    match ChromeFinder::new(chrome_path).find() {
        Ok(path) => println!("  {} Chrome found at {}", style("✅").green(), path.display()),
        Err(e) => {
            println!("  {} Chrome not found: {}", style("❌").red(), e);
            failures.push("chrome".to_string());
        }
    }

    match load_targets(urls) {
        Ok(targets) => {
            if targets.urls.is_empty() {
                println!(
                    "  {} {} has no valid URLs ({} invalid line(s))",
                    style("❌").red(),
                    urls.display(),
                    targets.invalid.len()
                );
                failures.push("target list".to_string());
            } else {
                println!(
                    "  {} {} valid URL(s) in {}",
                    style("✅").green(),
                    targets.urls.len(),
                    urls.display()
                );
                if !targets.invalid.is_empty() {
                    println!(
                        "  {}  {} invalid line(s) will be skipped",
                        style("⚠️").yellow(),
                        targets.invalid.len()
                    );
                }
            }
        }
        Err(e) => {
            println!(
                "  {} cannot read {}: {}",
                style("❌").red(),
                urls.display(),
                e
            );
            failures.push("target list".to_string());
        }
    }

    match check_writable(output_dir) {
        Ok(()) => println!(
            "  {} output directory {} is writable",
            style("✅").green(),
            output_dir.display()
        ),
        Err(e) => {
            println!(
                "  {} output directory {}: {}",
                style("❌").red(),
                output_dir.display(),
                e
            );
            failures.push("output directory".to_string());
        }
    }

    println!();
    if failures.is_empty() {
        println!("{}", style("All checks passed.").green().bold());
        Ok(())
    } else {
        bail!("checks failed: {}", failures.join(", "));
    }
}

fn check_writable(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe = dir.join(".beacon-doctor-probe");
    std::fs::write(&probe, b"ok")?;
    std::fs::remove_file(&probe)
}
