//! External chunk resource format
//!
//! Chunks are fetched by key `"{x}_{y}"` as JSON documents in the shape
//! below. Field names are part of the wire format and kept verbatim.
//!
//! ```json
//! {
//!   "width": 16, "height": 16, "tilewidth": 32, "tileheight": 32,
//!   "layers": [
//!     { "name": "world", "type": "tilelayer", "data": [0, 3, ...],
//!       "visible": true,
//!       "properties": [{ "name": "collides", "value": true, "type": "bool" }] }
//!   ],
//!   "tilesets": [{ "firstgid": 1, "name": "tileset", "tilewidth": 32, "tileheight": 32 }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, ChunkCoord, LayerKind, TileLayer};

/// A typed property attached to a layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerProperty {
    pub name: String,
    pub value: serde_json::Value,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One tile layer as it appears on the wire
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerData {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Vec<u16>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub properties: Vec<LayerProperty>,
}

fn default_visible() -> bool {
    true
}

impl LayerData {
    /// Whether this layer declares `collides: true`
    pub fn collides(&self) -> bool {
        self.properties
            .iter()
            .any(|p| p.name == "collides" && p.value == serde_json::Value::Bool(true))
    }
}

/// Tileset reference carried alongside the layers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TilesetRef {
    pub firstgid: u32,
    pub name: String,
    pub tilewidth: u32,
    pub tileheight: u32,
}

/// A complete chunk document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkData {
    pub width: u32,
    pub height: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    pub layers: Vec<LayerData>,
    #[serde(default)]
    pub tilesets: Vec<TilesetRef>,
}

impl ChunkData {
    /// Build the resident chunk for a coordinate from this document.
    ///
    /// Unknown layer names are skipped with a warning. The `world` layer is
    /// collidable whether or not the document says so; other layers collide
    /// only when flagged.
    pub fn into_chunk(self, coord: ChunkCoord) -> Chunk {
        let mut layers = Vec::with_capacity(self.layers.len());

        for layer in self.layers {
            let Some(kind) = LayerKind::from_name(&layer.name) else {
                log::warn!("chunk {coord}: skipping unknown layer '{}'", layer.name);
                continue;
            };
            let collides = layer.collides() || kind == LayerKind::World;
            layers.push(TileLayer::new(
                kind,
                self.width,
                self.height,
                layer.data,
                collides,
            ));
        }

        Chunk { coord, layers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{TILE_EMPTY, TILE_STONE};

    fn sample_json() -> &'static str {
        r#"{
            "width": 2, "height": 2, "tilewidth": 32, "tileheight": 32,
            "layers": [
                { "name": "ground", "type": "tilelayer", "data": [1, 1, 2, 5], "visible": true },
                { "name": "world", "type": "tilelayer", "data": [0, 3, 0, 0], "visible": true,
                  "properties": [{ "name": "collides", "value": true, "type": "bool" }] },
                { "name": "fog", "type": "tilelayer", "data": [0, 0, 0, 0], "visible": false }
            ],
            "tilesets": [{ "firstgid": 1, "name": "tileset", "tilewidth": 32, "tileheight": 32 }]
        }"#
    }

    #[test]
    fn test_parse_wire_format() {
        let data: ChunkData = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(data.width, 2);
        assert_eq!(data.layers.len(), 3);
        assert!(data.layers[1].collides());
        assert!(!data.layers[0].collides());
    }

    #[test]
    fn test_into_chunk_skips_unknown_layers() {
        let data: ChunkData = serde_json::from_str(sample_json()).unwrap();
        let chunk = data.into_chunk(ChunkCoord::new(0, 0));

        assert_eq!(chunk.layers.len(), 2);
        let world = chunk.layer(LayerKind::World).unwrap();
        assert!(world.collides);
        assert_eq!(world.tile(1, 0), Some(TILE_STONE));
        assert_eq!(world.tile(0, 0), Some(TILE_EMPTY));
    }

    #[test]
    fn test_world_layer_collides_without_property() {
        let json = r#"{
            "width": 1, "height": 1, "tilewidth": 32, "tileheight": 32,
            "layers": [{ "name": "world", "type": "tilelayer", "data": [3] }]
        }"#;
        let data: ChunkData = serde_json::from_str(json).unwrap();
        let chunk = data.into_chunk(ChunkCoord::new(1, 1));
        assert!(chunk.collision_layer().is_some());
    }
}
