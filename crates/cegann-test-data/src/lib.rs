//! POSCAR and checkpoint fixtures shared by the workspace tests.
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct TestFile {
    filebinary: &'static [u8],
    suffix: &'static str,
}

impl TestFile {
    /// Conventional fcc Cu cell, 4 atoms, VASP 5 layout.
    pub fn cu_fcc() -> Self {
        Self {
            filebinary: include_bytes!("../data/poscar/cu_fcc.POSCAR"),
            suffix: "POSCAR",
        }
    }

    /// B2 CuZr, 2 atoms, direct coordinates.
    pub fn cuzr_b2() -> Self {
        Self {
            filebinary: include_bytes!("../data/poscar/cuzr_b2.POSCAR"),
            suffix: "POSCAR",
        }
    }

    /// The B2 CuZr cell again, written with a scale factor of 2,
    /// Cartesian coordinates and selective dynamics flags.
    pub fn cuzr_cartesian() -> Self {
        Self {
            filebinary: include_bytes!("../data/poscar/cuzr_cartesian.POSCAR"),
            suffix: "POSCAR",
        }
    }

    /// VASP 4 layout: no species line, negative (volume) scale factor.
    pub fn cuzr_vasp4() -> Self {
        Self {
            filebinary: include_bytes!("../data/poscar/cuzr_vasp4.POSCAR"),
            suffix: "POSCAR",
        }
    }

    /// Declares four atoms but lists three positions.
    pub fn truncated() -> Self {
        Self {
            filebinary: include_bytes!("../data/poscar/truncated.POSCAR"),
            suffix: "POSCAR",
        }
    }

    /// Torch-style zip checkpoint, `{"model": state_dict, "epoch": 1, ...}`, for a
    /// GIN with 4 bond features, 3 angle features, `h_fea_edge: 4`,
    /// `n_conv_edge: 1`, `num_mlp: 1` and two classes. `convs.0.eps` is 0.25.
    pub fn gin_checkpoint() -> Self {
        Self {
            filebinary: include_bytes!("../data/checkpoints/gin_tiny.pth.tar"),
            suffix: "pth.tar",
        }
    }

    /// Torch-style zip checkpoint whose weights sit under `state_dict`.
    pub fn checkpoint_without_model_key() -> Self {
        Self {
            filebinary: include_bytes!("../data/checkpoints/no_model_key.pth.tar"),
            suffix: "pth.tar",
        }
    }

    pub fn contents(&self) -> &'static str {
        std::str::from_utf8(self.filebinary).unwrap_or_default()
    }

    /// Write the fixture as `<dir>/<stem>.<suffix>`.
    pub fn write_to(&self, dir: &Path, stem: &str) -> std::io::Result<PathBuf> {
        let path = dir.join(format!("{}.{}", stem, self.suffix));
        fs::write(&path, self.filebinary)?;
        Ok(path)
    }
}
