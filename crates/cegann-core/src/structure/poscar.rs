//! VASP POSCAR reader.
//!
//! Handles both the VASP 5 layout (a species line above the counts) and the
//! older VASP 4 layout. Without a species line the names come from symbols
//! trailing each position, then from the comment line, and failing both
//! from placeholder elements. Velocities and predictor-corrector blocks
//! after the positions are ignored.
use super::{Lattice, Structure};
use crate::{CoreError, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Poscar {
    pub comment: String,
    pub structure: Structure,
    pub selective_dynamics: bool,
}

struct Lines<'a> {
    path: &'a Path,
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(path: &'a Path, contents: &'a str) -> Self {
        Self {
            path,
            lines: contents.lines().collect(),
            pos: 0,
        }
    }

    fn error(&self, line: usize, message: impl Into<String>) -> CoreError {
        CoreError::Poscar {
            path: self.path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Next line and its 1-based number.
    fn next(&mut self, expected: &str) -> Result<(usize, &'a str)> {
        match self.lines.get(self.pos) {
            Some(line) => {
                self.pos += 1;
                Ok((self.pos, line))
            }
            None => Err(self.error(
                self.pos + 1,
                format!("unexpected end of file, expected {}", expected),
            )),
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn floats<const N: usize>(&mut self, expected: &str) -> Result<[f64; N]> {
        let (number, line) = self.next(expected)?;
        let mut values = [0.0; N];
        let mut tokens = line.split_whitespace();
        for value in values.iter_mut() {
            let token = tokens
                .next()
                .ok_or_else(|| self.error(number, format!("expected {} numbers for {}", N, expected)))?;
            *value = token.parse::<f64>().map_err(|_| {
                self.error(number, format!("could not parse `{}` as a number in {}", token, expected))
            })?;
        }
        Ok(values)
    }
}

/// Strip POTCAR decorations such as `Cu_pv` or `Zr_sv/0a1b2c`.
fn clean_species(token: &str) -> String {
    token
        .split(['/', '_'])
        .next()
        .unwrap_or(token)
        .to_string()
}

const PLACEHOLDER_ELEMENTS: [&str; 10] = ["H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne"];

/// Stand-in name for the `index`-th species group of an unlabelled file.
fn placeholder_species(index: usize) -> String {
    PLACEHOLDER_ELEMENTS
        .get(index)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("X{}", index + 1))
}

fn expand(names: &[String], counts: &[usize]) -> Vec<String> {
    names
        .iter()
        .zip(counts)
        .flat_map(|(name, &n)| std::iter::repeat(name.clone()).take(n))
        .collect()
}

fn is_species_symbol(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_lowercase())
        && token.len() <= 3
}

impl Poscar {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        Self::parse(&contents, path)
    }

    /// Parse POSCAR text; `path` is only used to label errors.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let mut lines = Lines::new(path, contents);

        let (_, comment) = lines.next("comment line")?;
        let comment = comment.trim().to_string();

        let [scale] = lines.floats::<1>("scale factor")?;
        let scale_line = lines.pos;
        if scale == 0.0 {
            return Err(lines.error(scale_line, "scale factor must be non-zero"));
        }

        let a = lines.floats::<3>("lattice vector a")?;
        let b = lines.floats::<3>("lattice vector b")?;
        let c = lines.floats::<3>("lattice vector c")?;
        let unscaled = Lattice::new([a, b, c]);
        let det = unscaled.determinant();
        if det.abs() < 1e-8 {
            return Err(lines.error(lines.pos, "lattice vectors are linearly dependent"));
        }
        // A negative scale is the target cell volume.
        let factor = if scale < 0.0 {
            (-scale / det.abs()).cbrt()
        } else {
            scale
        };
        let lattice = unscaled.scaled(factor);

        let (number, line) = lines.next("species names or counts")?;
        let first = line.split_whitespace().next().unwrap_or_default();
        let (species_names, counts_line) = if first.parse::<usize>().is_ok() {
            (None, (number, line))
        } else {
            let names: Vec<String> = line.split_whitespace().map(clean_species).collect();
            (Some(names), lines.next("species counts")?)
        };

        let counts = counts_line
            .1
            .split_whitespace()
            .map(|t| {
                t.parse::<usize>().map_err(|_| {
                    lines.error(counts_line.0, format!("could not parse `{}` as an atom count", t))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if counts.is_empty() || counts.iter().sum::<usize>() == 0 {
            return Err(lines.error(counts_line.0, "structure declares no atoms"));
        }

        if let Some(names) = &species_names {
            if names.len() != counts.len() {
                return Err(lines.error(
                    counts_line.0,
                    format!("{} species names but {} counts", names.len(), counts.len()),
                ));
            }
        }

        let mut selective_dynamics = false;
        if let Some(line) = lines.peek() {
            if line.trim_start().starts_with(['s', 'S']) {
                selective_dynamics = true;
                lines.next("selective dynamics")?;
            }
        }

        let (_, mode) = lines.next("coordinate mode")?;
        let cartesian = mode.trim_start().starts_with(['c', 'C', 'k', 'K']);

        // Per-site symbols trail the coordinates and the three flags.
        let symbol_column = if selective_dynamics { 6 } else { 3 };
        let total: usize = counts.iter().sum();
        let mut frac_coords = Vec::with_capacity(total);
        let mut site_symbols = Vec::with_capacity(total);
        for _ in 0..total {
            site_symbols.push(
                lines
                    .peek()
                    .and_then(|line| line.split_whitespace().nth(symbol_column))
                    .map(clean_species)
                    .filter(|token| is_species_symbol(token)),
            );
            let position = lines.floats::<3>("atomic position")?;
            let frac = if cartesian {
                let cart = position.map(|x| x * factor);
                lattice
                    .to_fractional(&cart)
                    .ok_or_else(|| lines.error(lines.pos, "singular lattice"))?
            } else {
                position
            };
            frac_coords.push(frac);
        }

        let species: Vec<String> = match species_names {
            Some(names) => expand(&names, &counts),
            None => match site_symbols.into_iter().collect::<Option<Vec<_>>>() {
                Some(symbols) => symbols,
                None => {
                    let names: Vec<String> =
                        comment.split_whitespace().map(clean_species).collect();
                    if names.len() == counts.len() && names.iter().all(|n| is_species_symbol(n)) {
                        expand(&names, &counts)
                    } else {
                        let names: Vec<String> =
                            (0..counts.len()).map(placeholder_species).collect();
                        tracing::warn!(
                            path = %path.display(),
                            species = ?names,
                            "no species names found, using placeholders"
                        );
                        expand(&names, &counts)
                    }
                }
            },
        };
        let structure = Structure::from_fractional(lattice, species, frac_coords);

        Ok(Self {
            comment,
            structure,
            selective_dynamics,
        })
    }
}

impl FromStr for Poscar {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, &PathBuf::from("<string>"))
    }
}
