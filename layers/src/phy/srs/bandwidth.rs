//! SRS bandwidth configuration
//! 
//! 3GPP TS 38.211 Table 6.4.1.4.3-1

/// Lookup of the number of resource blocks an SRS occupies
pub trait SrsBandwidthTable {
    /// m_SRS,b for configuration index C_SRS and bandwidth index B_SRS
    fn m_srs(&self, config_index: u8, bandwidth_index: u8) -> Option<u16>;
}

/// (m_SRS,b, N_b) for B_SRS = 0..3, indexed by C_SRS
pub const SRS_BANDWIDTH_CONFIG: [[(u16, u8); 4]; 64] = [
    [(4, 1), (4, 1), (4, 1), (4, 1)],
    [(8, 1), (4, 2), (4, 1), (4, 1)],
    [(12, 1), (4, 3), (4, 1), (4, 1)],
    [(16, 1), (4, 4), (4, 1), (4, 1)],
    [(16, 1), (8, 2), (4, 2), (4, 1)],
    [(20, 1), (4, 5), (4, 1), (4, 1)],
    [(24, 1), (4, 6), (4, 1), (4, 1)],
    [(24, 1), (12, 2), (4, 3), (4, 1)],
    [(28, 1), (4, 7), (4, 1), (4, 1)],
    [(32, 1), (16, 2), (8, 2), (4, 2)],
    [(36, 1), (12, 3), (4, 3), (4, 1)],
    [(40, 1), (20, 2), (4, 5), (4, 1)],
    [(48, 1), (16, 3), (8, 2), (4, 2)],
    [(48, 1), (24, 2), (12, 2), (4, 3)],
    [(52, 1), (4, 13), (4, 1), (4, 1)],
    [(56, 1), (28, 2), (4, 7), (4, 1)],
    [(60, 1), (20, 3), (4, 5), (4, 1)],
    [(64, 1), (32, 2), (16, 2), (4, 4)],
    [(72, 1), (24, 3), (12, 2), (4, 3)],
    [(72, 1), (36, 2), (12, 3), (4, 3)],
    [(76, 1), (4, 19), (4, 1), (4, 1)],
    [(80, 1), (40, 2), (20, 2), (4, 5)],
    [(88, 1), (44, 2), (4, 11), (4, 1)],
    [(96, 1), (32, 3), (16, 2), (4, 4)],
    [(96, 1), (48, 2), (24, 2), (4, 6)],
    [(104, 1), (52, 2), (4, 13), (4, 1)],
    [(112, 1), (56, 2), (28, 2), (4, 7)],
    [(120, 1), (60, 2), (20, 3), (4, 5)],
    [(120, 1), (40, 3), (8, 5), (4, 2)],
    [(120, 1), (24, 5), (12, 2), (4, 3)],
    [(128, 1), (64, 2), (32, 2), (4, 8)],
    [(128, 1), (64, 2), (16, 4), (4, 4)],
    [(128, 1), (16, 8), (8, 2), (4, 2)],
    [(132, 1), (44, 3), (4, 11), (4, 1)],
    [(136, 1), (68, 2), (4, 17), (4, 1)],
    [(144, 1), (72, 2), (36, 2), (4, 9)],
    [(144, 1), (48, 3), (24, 2), (12, 2)],
    [(144, 1), (48, 3), (16, 3), (4, 4)],
    [(144, 1), (16, 9), (8, 2), (4, 2)],
    [(152, 1), (76, 2), (4, 19), (4, 1)],
    [(160, 1), (80, 2), (40, 2), (4, 10)],
    [(160, 1), (80, 2), (20, 4), (4, 5)],
    [(160, 1), (32, 5), (16, 2), (4, 4)],
    [(168, 1), (84, 2), (28, 3), (4, 7)],
    [(176, 1), (88, 2), (44, 2), (4, 11)],
    [(184, 1), (92, 2), (4, 23), (4, 1)],
    [(192, 1), (96, 2), (48, 2), (4, 12)],
    [(192, 1), (96, 2), (24, 4), (4, 6)],
    [(192, 1), (64, 3), (16, 4), (4, 4)],
    [(192, 1), (24, 8), (8, 3), (4, 2)],
    [(208, 1), (104, 2), (52, 2), (4, 13)],
    [(216, 1), (108, 2), (36, 3), (4, 9)],
    [(224, 1), (112, 2), (56, 2), (4, 14)],
    [(240, 1), (120, 2), (60, 2), (4, 15)],
    [(240, 1), (80, 3), (20, 4), (4, 5)],
    [(240, 1), (48, 5), (16, 3), (8, 2)],
    [(240, 1), (24, 10), (12, 2), (4, 3)],
    [(256, 1), (128, 2), (64, 2), (4, 16)],
    [(256, 1), (128, 2), (32, 4), (4, 8)],
    [(256, 1), (16, 16), (8, 2), (4, 2)],
    [(264, 1), (132, 2), (44, 3), (4, 11)],
    [(272, 1), (136, 2), (68, 2), (4, 17)],
    [(272, 1), (68, 4), (4, 17), (4, 1)],
    [(272, 1), (16, 17), (8, 2), (4, 2)],
];

/// The NR SRS bandwidth table of TS 38.211
#[derive(Debug, Clone, Copy, Default)]
pub struct NrSrsBandwidthTable;

impl NrSrsBandwidthTable {
    /// (m_SRS,b, N_b) entry for C_SRS and B_SRS
    pub fn entry(config_index: u8, bandwidth_index: u8) -> Option<(u16, u8)> {
        SRS_BANDWIDTH_CONFIG
            .get(config_index as usize)?
            .get(bandwidth_index as usize)
            .copied()
    }
}

impl SrsBandwidthTable for NrSrsBandwidthTable {
    fn m_srs(&self, config_index: u8, bandwidth_index: u8) -> Option<u16> {
        Self::entry(config_index, bandwidth_index).map(|(m_srs, _)| m_srs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_table_lookup() {
        let table = NrSrsBandwidthTable;
        assert_eq!(table.m_srs(0, 0), Some(4));
        assert_eq!(table.m_srs(13, 1), Some(24));
        assert_eq!(table.m_srs(63, 0), Some(272));
        assert_eq!(table.m_srs(64, 0), None);
        assert_eq!(table.m_srs(0, 4), None);
    }
    
    #[test]
    fn test_table_tree_consistency() {
        // Each level splits the parent bandwidth into N_b equal sub-bands
        for (c_srs, row) in SRS_BANDWIDTH_CONFIG.iter().enumerate() {
            assert_eq!(row[0].1, 1, "C_SRS {}", c_srs);
            for b in 1..4 {
                let (m_b, n_b) = row[b];
                assert_eq!(row[b - 1].0, m_b * n_b as u16, "C_SRS {} B_SRS {}", c_srs, b);
            }
        }
    }
    
    #[test]
    fn test_smallest_sub_band_is_four_rbs() {
        for row in SRS_BANDWIDTH_CONFIG.iter() {
            assert!(row[3].0 >= 4);
            assert_eq!(row[3].0 % 4, 0);
        }
    }
}
