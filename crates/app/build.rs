use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn main() {
    // Packagers building from a tarball can pin the revision explicitly.
    println!("cargo:rerun-if-env-changed=FYYUR_BUILD_REV");
    let revision = std::env::var("FYYUR_BUILD_REV").ok().or_else(|| {
        let hash = git(&["rev-parse", "--short", "HEAD"])?;
        let dirty = git(&["status", "--porcelain"]).is_some_and(|s| !s.is_empty());
        Some(if dirty { format!("{hash}-dirty") } else { hash })
    });

    println!(
        "cargo:rustc-env=FYYUR_GIT_HASH={}",
        revision.as_deref().unwrap_or("unknown")
    );
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/index");
}
