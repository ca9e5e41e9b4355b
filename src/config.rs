// src/config.rs

use crate::error::{AtlasError, AtlasResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Beschreibung eines kompletten Kartenlaufs: Eingabedaten, Tessellation,
/// Projektion und Render-Ausgabe. Wird als JSON-Datei pro Datensatz gepflegt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Name des Datensatzes (für Logausgaben und Diagnose).
    pub name: String,
    /// Quelle und Filter der Landesgrenzen.
    pub boundaries: BoundaryConfig,
    /// Quelle und Format der Ankerpunkte.
    pub anchors: AnchorConfig,
    /// Projektion, in der tesselliert und verschnitten wird.
    #[serde(default)]
    pub projection: ProjectionKind,
    /// Weit entfernte Stützpunkte (lon, lat), die alle echten Zellen schließen.
    #[serde(default)]
    pub sentinels: Vec<[f64; 2]>,
    /// Dokumentierte Einzelfall-Reparaturen: verwaiste Zelle -> wahrer Besitzer.
    #[serde(default)]
    pub patches: Vec<CellPatch>,
    /// Render-Einstellungen für die Rasterausgabe.
    #[serde(default)]
    pub render: RenderConfig,
    /// Zielpfad des gerenderten Bildes.
    pub output: PathBuf,
}

/// Quelle der Verwaltungsgrenzen (GeoJSON) samt Auswahlfilter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub filter: BoundaryFilter,
}

/// Auswahlregeln für Länder-Features.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoundaryFilter {
    /// Aufnehmen, wenn der Kontinent des Features hier gelistet ist.
    #[serde(default)]
    pub continents: Vec<String>,
    /// Aufnehmen, wenn die Region (World-Bank-Stil) hier gelistet ist.
    #[serde(default)]
    pub regions: Vec<String>,
    /// Aufnehmen unabhängig von Kontinent/Region (z.B. "Turkey").
    #[serde(default)]
    pub include: Vec<String>,
    /// Abhängige Gebiete überspringen, deren Name vom Souverän abweicht.
    #[serde(default)]
    pub sovereign_only: bool,
    /// Ausnahmen der sovereign_only-Regel: Souveräne, deren Namensform
    /// im Datensatz vom Verwaltungsnamen abweicht (z.B. "Bosnia", "Serbia").
    #[serde(default)]
    pub sovereign_exceptions: Vec<String>,
}

/// Quelle der Ankerpunkte samt Format und Sonderfällen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorConfig {
    pub path: PathBuf,
    pub format: AnchorFormat,
    /// Nur Zeilen mit diesem Kontinent-Feld übernehmen (Capitals-Format).
    #[serde(default)]
    pub continent: Option<String>,
    /// Manuell gesetzte oder korrigierte Anker.
    #[serde(default)]
    pub overrides: Vec<AnchorOverride>,
    /// Anker, die beschriften dürfen, aber nicht als Saatpunkt dienen
    /// (Duplikat-Koordinaten, historischer Fall: Vatikan in Roms Zelle).
    #[serde(default)]
    pub exclude_from_tessellation: Vec<String>,
}

/// Zeilenformate der Ankerdateien.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorFormat {
    /// CSV: `Land,Hauptstadt,lat,lon,...,Kontinent`
    Capitals,
    /// Zeilen der Form `Name, (lat, lon)`
    Cities,
}

/// Ein manuell gesetzter Ankerpunkt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorOverride {
    pub territory: String,
    pub anchor: String,
    pub lat: f64,
    pub lon: f64,
}

/// Projektion, in der Saatpunkte und Grenzen verarbeitet werden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Grad-Koordinaten unverändert als Ebene (Plate Carrée).
    #[default]
    PlateCarree,
    /// Ellipsoidischer Mercator in Metern (World-Mercator-Definition).
    WorldMercator,
}

/// Reparatur einer verwaisten Tessellationszelle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellPatch {
    /// Index der Zelle in stabiler Extraktionsreihenfolge.
    pub cell: usize,
    /// Name des Territoriums, dem das Fragment zugeschlagen wird.
    pub owner: String,
}

/// Render-Einstellungen der Rasterausgabe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub viewport: ViewportConfig,
    /// Bildbreite in Pixeln; Höhe folgt aus dem Viewport-Seitenverhältnis.
    pub width_px: u32,
    #[serde(default)]
    pub palette: PaletteConfig,
    /// Hintergrundfarbe als `#rrggbb`.
    #[serde(default = "default_background")]
    pub background: String,
    /// Radius der Ankermarkierungen in Pixeln (0 = keine Marker).
    #[serde(default = "default_anchor_dot")]
    pub anchor_dot_px: u32,
    /// Landesumrisse über die Füllung zeichnen.
    #[serde(default)]
    pub draw_boundaries: bool,
}

/// Sichtbarer Kartenausschnitt in Grad (lon, lat).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

/// Farbzuordnung der Territorien. Ein angegebenes Palettenobjekt muss seinen
/// Modus benennen; fehlt der ganze Abschnitt, greift zyklische Zuordnung.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteConfig {
    #[serde(default)]
    pub colormap: ColormapKind,
    #[serde(flatten)]
    pub mode: PaletteMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColormapKind {
    #[default]
    Viridis,
    Tab20,
}

/// Zuordnungsmodus: handgepflegte Farbklassen oder zyklischer Index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PaletteMode {
    /// Pro Territorium eine Farbklasse aus `0..levels` (Reihenfolge der
    /// fertigen Territorienliste).
    Manual { classes: Vec<usize>, levels: usize },
    /// Territoriumsindex modulo Farbanzahl der Colormap.
    Cycle,
}

impl Default for PaletteMode {
    fn default() -> Self {
        PaletteMode::Cycle
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            colormap: ColormapKind::default(),
            mode: PaletteMode::default(),
        }
    }
}

fn default_background() -> String {
    "#ffffff".to_string()
}

fn default_anchor_dot() -> u32 {
    2
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            // Historischer Europa-Ausschnitt der Hauptstadtkarte.
            viewport: ViewportConfig {
                x: [-25.0, 41.0],
                y: [35.0, 72.0],
            },
            width_px: 1600,
            palette: PaletteConfig::default(),
            background: default_background(),
            anchor_dot_px: default_anchor_dot(),
            draw_boundaries: false,
        }
    }
}

impl DatasetConfig {
    /// Lädt und validiert eine Datensatzbeschreibung aus einer JSON-Datei.
    pub fn from_path(path: &Path) -> AtlasResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| AtlasError::DatasetIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: DatasetConfig =
            serde_json::from_str(&raw).map_err(|err| AtlasError::DatasetParse {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = output;
        self
    }

    pub fn with_projection(mut self, projection: ProjectionKind) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_patches(mut self, patches: Vec<CellPatch>) -> Self {
        self.patches = patches;
        self
    }

    pub fn validate(&self) -> AtlasResult<()> {
        if self.boundaries.path.as_os_str().is_empty() {
            return Err(AtlasError::InvalidConfiguration {
                message: "Boundary path must not be empty.".to_string(),
            });
        }
        if self.anchors.path.as_os_str().is_empty() {
            return Err(AtlasError::InvalidConfiguration {
                message: "Anchor path must not be empty.".to_string(),
            });
        }
        self.render.validate()?;
        if self.projection == ProjectionKind::WorldMercator {
            // Saatpunkte müssen projizierbar bleiben.
            for sentinel in &self.sentinels {
                if sentinel[1].abs() > 89.0 {
                    return Err(AtlasError::InvalidConfiguration {
                        message: format!(
                            "Sentinel latitude {} exceeds the Mercator validity range.",
                            sentinel[1]
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

impl RenderConfig {
    pub fn with_width_px(mut self, width_px: u32) -> Self {
        self.width_px = width_px.max(1);
        self
    }

    pub fn validate(&self) -> AtlasResult<()> {
        if self.viewport.x[0] >= self.viewport.x[1] || self.viewport.y[0] >= self.viewport.y[1] {
            return Err(AtlasError::InvalidConfiguration {
                message: "Viewport ranges must be ordered min < max.".to_string(),
            });
        }
        if self.width_px == 0 {
            return Err(AtlasError::InvalidConfiguration {
                message: "Render width must be greater than 0 pixels.".to_string(),
            });
        }
        if let PaletteMode::Manual { classes, levels } = &self.palette.mode {
            if classes.is_empty() {
                return Err(AtlasError::InvalidConfiguration {
                    message: "Manual palette requires at least one class entry.".to_string(),
                });
            }
            if *levels == 0 || classes.iter().any(|class| class >= levels) {
                return Err(AtlasError::InvalidConfiguration {
                    message: format!(
                        "Manual palette classes must lie below the level count ({levels})."
                    ),
                });
            }
        }
        Ok(())
    }
}
