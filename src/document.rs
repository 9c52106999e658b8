use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::DocumentConfig;
use crate::error::{Error, Result};
use crate::excellon::ExcellonWriter;
use crate::font::{Font, FontRegistry};
use crate::geometry::BoundingBox;
use crate::gerber::GerberWriter;
use crate::layer::{Layer, LayerRole};
use crate::primitive::RenderContext;
use crate::quantize::Quantizer;

/// A board: one layer per requested role, written once as a set of fabrication files.
#[derive(Debug, Clone)]
pub struct Document {
    prefix: String,
    config: DocumentConfig,
    fonts: FontRegistry,
    layers: BTreeMap<LayerRole, Layer>,
    written: bool,
}

impl Document {
    /// `prefix` names every output file, e.g. `board` gives `board.gtl`, `board.xln`, etc.
    pub fn new(prefix: impl Into<String>, config: DocumentConfig) -> Result<Self> {
        config.validate()?;
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(Error::Configuration("file name prefix is empty".to_string()));
        }

        Ok(Self {
            prefix,
            config,
            fonts: FontRegistry::new(),
            layers: BTreeMap::new(),
            written: false,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn register_font(&mut self, font: impl Font + 'static) -> &mut Self {
        self.fonts.register(font);
        self
    }

    /// The layer for `role`, created empty on first request.
    pub fn layer(&mut self, role: LayerRole) -> &mut Layer {
        self.layers
            .entry(role)
            .or_insert_with(|| Layer::new(role))
    }

    pub fn top_copper(&mut self) -> &mut Layer {
        self.layer(LayerRole::TopCopper)
    }

    pub fn bottom_copper(&mut self) -> &mut Layer {
        self.layer(LayerRole::BottomCopper)
    }

    /// Internal copper layer `index`, the layer below the top copper being 2.
    pub fn inner_copper(&mut self, index: u8) -> &mut Layer {
        self.layer(LayerRole::InnerCopper(index))
    }

    pub fn top_solder_mask(&mut self) -> &mut Layer {
        self.layer(LayerRole::TopSolderMask)
    }

    pub fn bottom_solder_mask(&mut self) -> &mut Layer {
        self.layer(LayerRole::BottomSolderMask)
    }

    pub fn top_silkscreen(&mut self) -> &mut Layer {
        self.layer(LayerRole::TopSilkscreen)
    }

    pub fn bottom_silkscreen(&mut self) -> &mut Layer {
        self.layer(LayerRole::BottomSilkscreen)
    }

    pub fn outline(&mut self) -> &mut Layer {
        self.layer(LayerRole::Outline)
    }

    pub fn drill(&mut self) -> &mut Layer {
        self.layer(LayerRole::Drill)
    }

    pub fn get(&self, role: LayerRole) -> Option<&Layer> {
        self.layers.get(&role)
    }

    /// Requested layers, in write order.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    /// Top and bottom plus one per inner layer, counting up to the deepest inner layer requested.
    pub fn copper_layer_count(&self) -> u8 {
        self.layers
            .keys()
            .filter_map(|role| match role {
                LayerRole::InnerCopper(index) => Some(index.saturating_add(1)),
                _ => None,
            })
            .max()
            .unwrap_or(2)
            .max(2)
    }

    pub fn context(&self) -> RenderContext<'_> {
        RenderContext::new(&self.config, &self.fonts)
    }

    /// Union of every layer's box.
    pub fn bounding_box(&self) -> Result<BoundingBox> {
        let context = self.context();
        let mut bbox = BoundingBox::default();
        for layer in self.layers.values() {
            bbox.expand(&layer.bounding_box(&context)?);
        }
        Ok(bbox)
    }

    fn check_roles(&self) -> Result<()> {
        for role in self.layers.keys() {
            if let LayerRole::InnerCopper(index) = role {
                if *index < 2 {
                    return Err(Error::Configuration(format!(
                        "inner copper layers are numbered from 2, got {}",
                        index
                    )));
                }
            }
        }
        Ok(())
    }

    /// Writes one layer to `out`, as Excellon for the drill layer and RS-274X for every other layer.
    pub fn render_layer<W: Write>(&self, role: LayerRole, out: &mut W) -> Result<()> {
        self.check_roles()?;
        let layer = self
            .layers
            .get(&role)
            .ok_or_else(|| Error::Configuration(format!("the {} layer was never requested", role)))?;

        if role.is_drill() {
            ExcellonWriter::new(Quantizer::new(self.config.format, self.config.units)).write(layer, out)
        } else {
            GerberWriter::new(self.context(), self.copper_layer_count()).write(layer, out)
        }
    }

    /// Writes every non-empty layer into `directory`, returning the written paths in write order.
    ///
    /// A document is written once, a second call fails. Files written before a failing layer are left in place.
    #[profiling::function]
    pub fn write(&mut self, directory: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        if self.written {
            return Err(Error::Configuration(format!(
                "document '{}' has already been written",
                self.prefix
            )));
        }
        self.check_roles()?;
        self.written = true;

        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;

        let mut paths = Vec::new();
        for (role, layer) in &self.layers {
            if layer.is_empty() {
                debug!("skipping empty {} layer", role);
                continue;
            }

            let path = directory.join(role.file_name(&self.prefix));
            self.write_file(*role, &path)
                .map_err(|error| error.in_layer(*role))?;

            info!("wrote {} layer, primitives: {}, path: {}", role, layer.len(), path.display());
            paths.push(path);
        }

        Ok(paths)
    }

    fn write_file(&self, role: LayerRole, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.render_layer(role, &mut out)?;
        out.flush()?;
        Ok(())
    }
}
