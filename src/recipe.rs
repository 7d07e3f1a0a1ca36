//! Read values out of YAML analysis recipes

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_json::Value;

use crate::error::{Error, Result};

/// Key holding the voxel size of each axis in microns
pub static VOXEL_SIZE: &str = "VoxelSize";

/// A parsed recipe: a top-level YAML mapping
#[derive(Debug)]
pub struct Recipe {
    path: PathBuf,
    params: BTreeMap<String, Value>,
}

impl Recipe {
    pub fn load(path: &Path) -> Result<Recipe> {
        info!("Reading recipe {}", path.display());
        let yaml = fs::read_to_string(path).map_err(Error::io(path))?;
        Recipe::parse(path, &yaml)
    }

    fn parse(path: &Path, yaml: &str) -> Result<Recipe> {
        let params: BTreeMap<String, Value> = serde_saphyr::from_str(yaml)
            .map_err(|source| Error::Yaml { path: path.to_path_buf(), source })?;
        debug!("Recipe keys: {:?}", params.keys().collect::<Vec<_>>());
        Ok(Recipe { path: path.to_path_buf(), params })
    }

    pub fn value(&self, key: &str) -> Result<&Value> {
        self.params.get(key).ok_or_else(|| Error::MissingKey {
            key: key.to_string(),
            path: self.path.clone(),
        })
    }

    pub fn voxel_sizes(&self) -> Result<Vec<f64>> {
        let value = self.value(VOXEL_SIZE)?;
        serde_json::from_value(value.clone()).map_err(|source| Error::InvalidValue {
            key: VOXEL_SIZE.to_string(),
            path: self.path.clone(),
            source,
        })
    }
}

/// Voxel sizes from the recipe at `recipe_path`
pub fn voxel_sizes(recipe_path: &Path) -> Result<Vec<f64>> {
    Recipe::load(recipe_path)?.voxel_sizes()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    static RECIPE: &str = "\
VoxelSize: [5, 2, 2]
Orientation: psl
Atlas:
  name: allen_mouse
  resolution: 10
";

    #[test]
    fn reads_voxel_sizes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("recipe.yaml");
        fs::write(&path, RECIPE).unwrap();

        assert_eq!(voxel_sizes(&path).unwrap(), vec![5.0, 2.0, 2.0]);
    }

    #[test]
    fn other_values() {
        let recipe = Recipe::parse(Path::new("recipe.yaml"), RECIPE).unwrap();
        assert_eq!(recipe.value("Orientation").unwrap(), &json!("psl"));
        assert_eq!(recipe.value("Atlas").unwrap()["resolution"], json!(10));
    }

    #[test]
    fn missing_key() {
        let recipe = Recipe::parse(Path::new("recipe.yaml"), "Orientation: psl\n").unwrap();
        assert!(matches!(recipe.voxel_sizes(), Err(Error::MissingKey { .. })));
    }

    #[test]
    fn wrong_shape() {
        let recipe = Recipe::parse(Path::new("recipe.yaml"), "VoxelSize: tiny\n").unwrap();
        assert!(matches!(recipe.voxel_sizes(), Err(Error::InvalidValue { .. })));
    }

    #[test]
    fn malformed() {
        let err = Recipe::parse(Path::new("recipe.yaml"), "VoxelSize: [5, 2\n").unwrap_err();
        assert!(matches!(err, Error::Yaml { .. }));
    }

    #[test]
    fn missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = voxel_sizes(&tmp.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
