use super::{CrystalGraph, FeatureDims, GaussianBasis, GraphBuilder, GraphKind, NeighborSearch};
use crate::structure::{dot, norm};
use crate::{CoreError, Result, Settings, Structure};
use itertools::{iproduct, Itertools};
use std::collections::HashMap;

/// Bond features from bond lengths, angle features from bond-pair cosines.
#[derive(Clone, Debug)]
pub struct HomogeneousGraph {
    search: NeighborSearch,
    gbf_bond: GaussianBasis,
    gbf_angle: GaussianBasis,
}

impl HomogeneousGraph {
    pub fn new(settings: &Settings) -> Self {
        Self {
            search: NeighborSearch::from_settings(settings),
            gbf_bond: settings.gbf_bond.clone(),
            gbf_angle: settings.gbf_angle.clone(),
        }
    }
}

impl GraphBuilder for HomogeneousGraph {
    fn kind(&self) -> GraphKind {
        GraphKind::Homogeneous
    }

    fn feature_dims(&self) -> FeatureDims {
        FeatureDims {
            bond: self.gbf_bond.len(),
            angle: self.gbf_angle.len(),
        }
    }

    fn build(&self, structure: &Structure) -> Result<CrystalGraph> {
        let (lists, radius) = self.search.search(structure)?;
        let k = self.search.neighbors;
        let num_atoms = structure.num_sites();
        let num_bonds = num_atoms * k;
        let num_angles = num_atoms * k * (k - 1);

        let mut bond_features = Vec::with_capacity(num_bonds * self.gbf_bond.len());
        let mut bond_centers = Vec::with_capacity(num_bonds);
        let mut bond_neighbors = Vec::with_capacity(num_bonds);
        for (center, list) in lists.iter().enumerate() {
            for neighbor in list {
                self.gbf_bond.expand_into(neighbor.distance, &mut bond_features);
                bond_centers.push(center as u32);
                bond_neighbors.push(neighbor.index as u32);
            }
        }

        let mut angle_features = Vec::with_capacity(num_angles * self.gbf_angle.len());
        let mut angle_cosines = Vec::with_capacity(num_angles);
        let mut angle_src = Vec::with_capacity(num_angles);
        let mut angle_dst = Vec::with_capacity(num_angles);
        for (center, list) in lists.iter().enumerate() {
            let first_bond = center * k;
            for (dst, src) in iproduct!(0..k, 0..k).filter(|(dst, src)| dst != src) {
                let u = &list[dst].vector;
                let v = &list[src].vector;
                let cosine = (dot(u, v) / (norm(u) * norm(v))).clamp(-1.0, 1.0);
                self.gbf_angle.expand_into(cosine, &mut angle_features);
                angle_cosines.push(cosine as f32);
                angle_src.push((first_bond + src) as u32);
                angle_dst.push((first_bond + dst) as u32);
            }
        }

        tracing::debug!(
            "graph for {}: {} atoms, {} bonds, {} angles, radius {:.3}",
            structure.formula(),
            num_atoms,
            num_bonds,
            num_angles,
            radius
        );

        Ok(CrystalGraph {
            num_atoms,
            bond_fea_len: self.gbf_bond.len(),
            bond_features,
            bond_centers,
            bond_neighbors,
            angle_fea_len: self.gbf_angle.len(),
            angle_features,
            angle_cosines,
            angle_src,
            angle_dst,
            target: 0.0,
        })
    }
}

/// Homogeneous features plus species codes: every bond gets a one-hot code of
/// its unordered species pair and every angle a one-hot code of its center species.
#[derive(Clone, Debug)]
pub struct HeterogeneousGraph {
    base: HomogeneousGraph,
    species: Vec<String>,
    pairs: HashMap<(usize, usize), usize>,
}

impl HeterogeneousGraph {
    pub fn new(settings: &Settings) -> Self {
        let species = settings.species.clone();
        let pairs = (0..species.len())
            .combinations_with_replacement(2)
            .enumerate()
            .map(|(code, pair)| ((pair[0], pair[1]), code))
            .collect();
        Self {
            base: HomogeneousGraph::new(settings),
            species,
            pairs,
        }
    }

    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    fn species_index(&self, symbol: &str) -> Result<usize> {
        self.species
            .iter()
            .position(|s| s == symbol)
            .ok_or_else(|| CoreError::UnknownSpecies {
                species: symbol.to_string(),
                known: self.species.clone(),
            })
    }

    fn pair_code(&self, a: usize, b: usize) -> usize {
        self.pairs[&(a.min(b), a.max(b))]
    }
}

fn push_one_hot(code: usize, len: usize, out: &mut Vec<f32>) {
    out.extend((0..len).map(|i| if i == code { 1.0 } else { 0.0 }));
}

impl GraphBuilder for HeterogeneousGraph {
    fn kind(&self) -> GraphKind {
        GraphKind::Heterogeneous
    }

    fn feature_dims(&self) -> FeatureDims {
        let base = self.base.feature_dims();
        FeatureDims {
            bond: base.bond + self.num_pairs(),
            angle: base.angle + self.species.len(),
        }
    }

    fn build(&self, structure: &Structure) -> Result<CrystalGraph> {
        let codes = structure
            .sites()
            .iter()
            .map(|site| self.species_index(&site.species))
            .collect::<Result<Vec<_>>>()?;
        let base = self.base.build(structure)?;
        let dims = self.feature_dims();

        let mut bond_features = Vec::with_capacity(base.num_bonds() * dims.bond);
        for (b, chunk) in base.bond_features.chunks(base.bond_fea_len).enumerate() {
            bond_features.extend_from_slice(chunk);
            let center = codes[base.bond_centers[b] as usize];
            let neighbor = codes[base.bond_neighbors[b] as usize];
            push_one_hot(self.pair_code(center, neighbor), self.num_pairs(), &mut bond_features);
        }

        let mut angle_features = Vec::with_capacity(base.num_angles() * dims.angle);
        for (a, chunk) in base.angle_features.chunks(base.angle_fea_len).enumerate() {
            angle_features.extend_from_slice(chunk);
            let bond = base.angle_dst[a] as usize;
            let center = codes[base.bond_centers[bond] as usize];
            push_one_hot(center, self.species.len(), &mut angle_features);
        }

        Ok(CrystalGraph {
            bond_fea_len: dims.bond,
            bond_features,
            angle_fea_len: dims.angle,
            angle_features,
            ..base
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Poscar;
    use cegann_test_data::TestFile;

    fn small_settings() -> Settings {
        Settings {
            neighbors: 4,
            gbf_bond: GaussianBasis::new(0.0, 6.0, 8),
            gbf_angle: GaussianBasis::new(-1.0, 1.0, 5),
            ..Settings::default()
        }
    }

    #[test]
    fn test_homogeneous_shapes() {
        let poscar: Poscar = TestFile::cu_fcc().contents().parse().unwrap();
        let builder = HomogeneousGraph::new(&small_settings());
        let graph = builder.build(&poscar.structure).unwrap();

        assert_eq!(graph.num_atoms, 4);
        assert_eq!(graph.num_bonds(), 16);
        assert_eq!(graph.num_angles(), 4 * 4 * 3);
        assert_eq!(graph.bond_features.len(), 16 * 8);
        assert_eq!(graph.angle_features.len(), 48 * 5);
        assert_eq!(graph.feature_dims(), builder.feature_dims());
        assert!(graph.angle_cosines.iter().all(|c| (-1.0..=1.0).contains(c)));
    }

    #[test]
    fn test_angles_link_bonds_of_same_center() {
        let poscar: Poscar = TestFile::cuzr_b2().contents().parse().unwrap();
        let graph = HomogeneousGraph::new(&small_settings())
            .build(&poscar.structure)
            .unwrap();
        for (src, dst) in graph.angle_src.iter().zip(&graph.angle_dst) {
            assert_ne!(src, dst);
            assert_eq!(
                graph.bond_centers[*src as usize],
                graph.bond_centers[*dst as usize]
            );
        }
        // every bond receives one message from each other bond at its center
        let mut incoming = vec![0usize; graph.num_bonds()];
        for dst in &graph.angle_dst {
            incoming[*dst as usize] += 1;
        }
        assert!(incoming.iter().all(|&n| n == 3));
    }

    #[test]
    fn test_heterogeneous_codes() {
        let poscar: Poscar = TestFile::cuzr_b2().contents().parse().unwrap();
        let builder = HeterogeneousGraph::new(&small_settings());
        assert_eq!(builder.num_pairs(), 3);
        assert_eq!(builder.feature_dims(), FeatureDims { bond: 11, angle: 7 });

        let graph = builder.build(&poscar.structure).unwrap();
        assert_eq!(graph.bond_features.len(), graph.num_bonds() * 11);
        // B2: the four nearest neighbors of Cu are all Zr, so the Cu-Zr pair code is set
        let first_bond = &graph.bond_features[0..11];
        assert_eq!(&first_bond[8..], &[0.0, 1.0, 0.0]);
        let first_angle = &graph.angle_features[0..7];
        assert_eq!(&first_angle[5..], &[1.0, 0.0]);
    }

    #[test]
    fn test_heterogeneous_rejects_unknown_species() {
        let text = "NiAl\n1.0\n2.88 0 0\n0 2.88 0\n0 0 2.88\nNi Al\n1 1\nDirect\n0 0 0\n0.5 0.5 0.5\n";
        let poscar: Poscar = text.parse().unwrap();
        let err = HeterogeneousGraph::new(&small_settings())
            .build(&poscar.structure)
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownSpecies { .. }));
    }

    #[test]
    fn test_unlabelled_vasp4_is_homogeneous_only() {
        let text = "frame 17\n1.0\n3.26 0 0\n0 3.26 0\n0 0 3.26\n1 1\nDirect\n0 0 0\n0.5 0.5 0.5\n";
        let poscar: Poscar = text.parse().unwrap();
        let settings = small_settings();
        assert!(HomogeneousGraph::new(&settings).build(&poscar.structure).is_ok());
        match HeterogeneousGraph::new(&settings).build(&poscar.structure) {
            Err(CoreError::UnknownSpecies { species, .. }) => assert_eq!(species, "H"),
            other => panic!("unexpected result {:?}", other.map(|g| g.num_atoms)),
        }
    }

    #[test]
    fn test_kind_from_flag() {
        assert_eq!(GraphKind::from_flag(None), GraphKind::Homogeneous);
        assert_eq!(GraphKind::from_flag(Some("homogeneous")), GraphKind::Homogeneous);
        assert_eq!(GraphKind::from_flag(Some("hetero")), GraphKind::Homogeneous);
        assert_eq!(
            GraphKind::from_flag(Some("heterogeneous")),
            GraphKind::Heterogeneous
        );
        let settings = small_settings();
        assert_eq!(
            GraphKind::from_flag(Some("heterogeneous")).builder(&settings).kind(),
            GraphKind::Heterogeneous
        );
    }
}
