use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::network::config::NetConfig;

/// One fully-connected layer of a network specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
}

/// A fully serializable description of a network architecture plus its
/// training configuration.
///
/// The first layer is the input layer, the last the output layer; its size
/// is the number of classes the confusion matrices track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the model file stem.
    pub name: String,
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub config: NetConfig,
}

impl NetworkSpec {
    /// A spec with default config and one layer per entry of `sizes`.
    pub fn new(name: impl Into<String>, sizes: &[usize]) -> Self {
        NetworkSpec {
            name: name.into(),
            layers: sizes.iter().map(|&size| LayerSpec { size }).collect(),
            config: NetConfig::default(),
        }
    }

    pub fn with_config(mut self, config: NetConfig) -> Self {
        self.config = config;
        self
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_str(json: &str) -> Result<NetworkSpec> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::UpdateFn;

    #[test]
    fn spec_reads_from_json_without_config() {
        let spec = NetworkSpec::from_json_str(r#"{"name":"xor","layers":[{"size":2},{"size":3},{"size":2}]}"#).unwrap();
        assert_eq!(spec.layers.len(), 3);
        assert_eq!(spec.config, NetConfig::default());
    }

    #[test]
    fn save_and_load_agree() {
        let path = std::env::temp_dir().join(format!("ferrite-net-spec-{}.json", std::process::id()));
        let path = path.to_str().unwrap().to_string();
        let spec = NetworkSpec::new("roundtrip", &[4, 3])
            .with_config(NetConfig { update_fn: UpdateFn::Rmsprop, ..NetConfig::default() });
        spec.save_json(&path).unwrap();
        let loaded = NetworkSpec::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, spec);
    }
}
