//! Locating and loading the structures of a prediction run.
use crate::{CoreError, Poscar, Result, StructureRecord};
use glob::MatchOptions;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

pub const POSCAR_SUFFIX: &str = ".POSCAR";

/// Compare strings the way a person would: runs of digits are compared by value,
/// so `A2` sorts before `A10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut xs = a.chars().peekable();
    let mut ys = b.chars().peekable();
    loop {
        match (xs.peek().copied(), ys.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let run_x = take_digits(&mut xs);
                let run_y = take_digits(&mut ys);
                let trimmed_x = run_x.trim_start_matches('0');
                let trimmed_y = run_y.trim_start_matches('0');
                let ord = trimmed_x
                    .len()
                    .cmp(&trimmed_y.len())
                    .then_with(|| trimmed_x.cmp(trimmed_y));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                xs.next();
                ys.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}

/// The file name without its `.POSCAR` suffix.
pub fn structure_label(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(POSCAR_SUFFIX) {
        Some(stem) => stem.to_string(),
        None => name,
    }
}

/// All `*.POSCAR` files directly inside `dir`, in natural order of their names.
///
/// Matching follows shell glob rules: hidden files are skipped, and a
/// directory that does not exist (or is a plain file) matches nothing.
pub fn discover_structures(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        tracing::warn!("{} does not exist, no structures to predict", dir.display());
        return Ok(Vec::new());
    }
    let pattern = format!(
        "{}/*{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        POSCAR_SUFFIX
    );
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::default()
    };
    let mut files = Vec::new();
    for entry in glob::glob_with(&pattern, options)? {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            CoreError::io(path, e.into_error())
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| natural_cmp(&structure_label(a), &structure_label(b)));
    tracing::info!("found {} structure files in {}", files.len(), dir.display());
    Ok(files)
}

/// Parse every file into a record. The first malformed file aborts the whole load.
pub fn load_records(paths: &[PathBuf]) -> Result<Vec<StructureRecord>> {
    paths
        .iter()
        .map(|path| {
            let poscar = Poscar::from_file(path)?;
            let label = structure_label(path);
            tracing::debug!(
                "parsed {} ({}, {} sites)",
                label,
                poscar.structure.formula(),
                poscar.structure.num_sites()
            );
            Ok(StructureRecord::new(label, poscar.structure))
        })
        .collect()
}
