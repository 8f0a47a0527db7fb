//! Line-oriented MTL subset parser.
//!
//! The only recognized tag is `map_Kd <imagePath>`. The number of such
//! lines decides the owning object's texture binding mode: one line means
//! a single bound texture, two or more mean an indexed (animated) set.

use std::path::Path;

use crate::error::AssetError;

/// Material description resolved from an MTL file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialDesc {
    /// Texture file names from `map_Kd` lines, in file order.
    pub texture_files: Vec<String>,
}

impl MaterialDesc {
    /// True when the material selects indexed (animated) binding.
    pub fn is_indexed(&self) -> bool {
        self.texture_files.len() > 1
    }
}

/// Load and parse an MTL file from disk.
pub fn load_mtl(path: &Path) -> Result<MaterialDesc, AssetError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AssetError::io(path.display().to_string(), &e))?;
    Ok(parse_mtl(&text))
}

/// Parse MTL text.
pub fn parse_mtl(text: &str) -> MaterialDesc {
    let mut material = MaterialDesc::default();
    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        if tokens.next() == Some("map_Kd") {
            if let Some(name) = tokens.next() {
                material.texture_files.push(name.to_owned());
            }
        }
    }
    material
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_map_kd_selects_single_mode() {
        let m = parse_mtl("newmtl crate\nKd 1 1 1\nmap_Kd crate.bmp\n");
        assert_eq!(m.texture_files, vec!["crate.bmp"]);
        assert!(!m.is_indexed());
    }

    #[test]
    fn many_map_kd_select_indexed_mode() {
        let m = parse_mtl("map_Kd f0.bmp\nmap_Kd f1.bmp\nmap_Kd f2.bmp\n");
        assert_eq!(m.texture_files.len(), 3);
        assert!(m.is_indexed());
    }

    #[test]
    fn no_map_kd_yields_empty_material() {
        let m = parse_mtl("newmtl flat\nKd 0.5 0.5 0.5\n");
        assert!(m.texture_files.is_empty());
        assert!(!m.is_indexed());
    }
}
