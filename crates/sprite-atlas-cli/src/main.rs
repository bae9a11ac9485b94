use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{ImageReader, RgbaImage};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use sprite_atlas_core::prelude::*;
use sprite_atlas_core::{AtlasError, Result as AtlasResult};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "sprite-atlas",
    about = "Pack sprites into texture atlas bins",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack a file or folder of images into atlas bins
    Pack(PackArgs),
    /// Repack an existing atlas (keeps its atlas id and sprite ids)
    Repack(RepackArgs),
    /// Print statistics of an atlas description
    Stats(StatsArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name_N.png and name.json)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (values present in the file override flags)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    #[command(flatten)]
    layout: LayoutArgs,

    /// Quality tier for every sprite: normal|legacy|half|full|alpha_split
    #[arg(long, default_value = "full", help_heading = "Layout")]
    quality: String,

    // Export
    /// Layout-only: compute placements and write the JSON description (no PNGs)
    #[arg(long, default_value_t = false, help_heading = "Export")]
    layout_only: bool,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct LayoutArgs {
    /// Max bin side: 32|64|128|256|512|1024|2048|4096
    #[arg(long, default_value_t = 1024, help_heading = "Layout")]
    max_size: u32,
    /// Pixels reserved right of and below every sprite
    #[arg(long, default_value_t = 1, help_heading = "Layout")]
    padding: u32,
    /// Keep power-of-two bin sizes
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    pow2: bool,
    /// Force square bins
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    square: bool,
    /// Algorithm for every tier: skyline | slice | advanced (default: per-tier profile)
    #[arg(long, value_parser = ["skyline", "slice", "advanced"], help_heading = "Algorithms")]
    algorithm: Option<String>,
}

#[derive(Parser, Debug, Clone)]
struct RepackArgs {
    /// Atlas description written by `pack` (bins are read from NAME_N.png next to it)
    atlas: PathBuf,
    /// Output directory (defaults to the atlas directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
    /// Images to add; a sprite with the same name is replaced
    #[arg(long)]
    add: Vec<PathBuf>,
    /// Sprite names to drop
    #[arg(long)]
    remove: Vec<String>,
    /// Quality tier for added sprites
    #[arg(long, default_value = "full")]
    quality: String,
    /// Override the atlas max bin side
    #[arg(long)]
    max_size: Option<u32>,
    /// Override the atlas padding
    #[arg(long)]
    padding: Option<u32>,
    /// Override power-of-two bins
    #[arg(long)]
    pow2: Option<bool>,
    /// Override square bins
    #[arg(long)]
    square: Option<bool>,
    /// Compute the new layout but do not write files
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct StatsArgs {
    /// Atlas description (JSON)
    atlas: PathBuf,
    /// Print stats as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let show_progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Pack(args) => run_pack(args, show_progress),
        Commands::Repack(args) => run_repack(args, show_progress),
        Commands::Stats(args) => run_stats(args),
    }
}

/// Flags merged with the optional YAML file.
#[derive(Debug, Clone, Serialize)]
struct EffectiveConfig {
    setting: PackSetting,
    quality: QualityTier,
    algorithm: Option<AlgorithmKind>,
    rules: Vec<QualityRule>,
}

/// Assigns a tier to every sprite whose path matches `pattern`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QualityRule {
    pattern: String,
    quality: QualityTier,
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    max_atlas_size: Option<u32>,
    padding: Option<u32>,
    power_of_two: Option<bool>,
    force_square: Option<bool>,
    quality: Option<String>,
    algorithm: Option<String>,
    #[serde(default)]
    rules: Vec<QualityRule>,
}

impl YamlConfig {
    fn merge_into(self, mut cfg: EffectiveConfig) -> anyhow::Result<EffectiveConfig> {
        if let Some(v) = self.max_atlas_size {
            cfg.setting.max_atlas_size = v;
        }
        if let Some(v) = self.padding {
            cfg.setting.padding = v;
        }
        if let Some(v) = self.power_of_two {
            cfg.setting.power_of_two = v;
        }
        if let Some(v) = self.force_square {
            cfg.setting.force_square = v;
        }
        if let Some(q) = self.quality {
            cfg.quality = parse_quality(&q)?;
        }
        if let Some(a) = self.algorithm {
            cfg.algorithm = Some(parse_algorithm(&a)?);
        }
        cfg.rules.extend(self.rules);
        Ok(cfg)
    }
}

fn parse_quality(s: &str) -> anyhow::Result<QualityTier> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown quality tier: {}", s))
}

fn parse_algorithm(s: &str) -> anyhow::Result<AlgorithmKind> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown algorithm: {}", s))
}

fn effective_config(cli: &PackArgs) -> anyhow::Result<EffectiveConfig> {
    let setting = PackSetting::builder()
        .max_atlas_size(cli.layout.max_size)
        .padding(cli.layout.padding)
        .pow2(cli.layout.pow2)
        .square(cli.layout.square)
        .build();
    let mut cfg = EffectiveConfig {
        setting,
        quality: parse_quality(&cli.quality)?,
        algorithm: cli
            .layout
            .algorithm
            .as_deref()
            .map(parse_algorithm)
            .transpose()?,
        rules: Vec::new(),
    };
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.merge_into(cfg)?;
    }
    Ok(cfg)
}

fn build_packer(setting: PackSetting, algorithm: Option<AlgorithmKind>) -> AtlasPacker {
    let mut registry = TierRegistry::builtin();
    if let Some(kind) = algorithm {
        for tier in QualityTier::ALL {
            if let Ok(profile) = registry.profile(tier) {
                let profile = TierProfile {
                    algorithm: kind,
                    ..*profile
                };
                registry.register(tier, profile);
            }
        }
    }
    AtlasPacker::new(setting).with_registry(registry)
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = effective_config(cli)?;
    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }
    cfg.setting.validate()?;

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let rules = build_rules(&cfg.rules)?;
    let sprites = load_sprites_with_progress(&cli.input, &paths, show_progress)?
        .into_iter()
        .map(|s| {
            let quality = rules.quality_of(&s.name).unwrap_or(cfg.quality);
            s.with_quality(quality)
        })
        .collect::<Vec<_>>();
    info!(count = sprites.len(), "loaded input images");

    let packer = build_packer(cfg.setting.clone(), cfg.algorithm);
    let start = Instant::now();
    let (atlas, bins) = if cli.layout_only {
        (packer.layout(&sprites)?, Vec::new())
    } else {
        let mut canvas = ProgressCanvas::new(sprites.len(), show_progress)?;
        let atlas = packer.pack(&sprites, &mut canvas)?;
        (atlas, canvas.finish())
    };
    report(&atlas, start);

    if !cli.dry_run {
        write_atlas(&cli.out_dir, &cli.name, &atlas, &bins)?;
    }
    Ok(())
}

fn run_repack(cli: &RepackArgs, show_progress: bool) -> anyhow::Result<()> {
    let (previous, name) = read_atlas(&cli.atlas)?;
    let dir = cli
        .atlas
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut bins = Vec::with_capacity(previous.bins.len());
    for i in 0..previous.bins.len() {
        let png_path = dir.join(bin_file_name(&name, i));
        let rgba = load_image(&png_path)
            .with_context(|| format!("read bin {}", png_path.display()))?;
        bins.push(rgba);
    }

    let mut sprites: Vec<ImageSprite> = list_atlas_sprites(&previous, &bins)?
        .into_iter()
        .map(ImageSprite::from)
        .filter(|s| !cli.remove.contains(&s.name))
        .collect();
    let quality = parse_quality(&cli.quality)?;
    for path in &cli.add {
        let root = path.parent().unwrap_or(path);
        for added in load_sprites_with_progress(root, &gather_paths(path, &[], &[])?, show_progress)? {
            let added = added.with_quality(quality);
            match sprites.iter_mut().find(|s| s.name == added.name) {
                Some(existing) => {
                    info!(name = %added.name, "replacing sprite");
                    let id = existing.id;
                    *existing = added;
                    existing.id = id;
                }
                None => sprites.push(added),
            }
        }
    }

    let mut setting = AtlasPacker::for_atlas(&previous).setting().clone();
    if let Some(v) = cli.max_size {
        setting.max_atlas_size = v;
    }
    if let Some(v) = cli.padding {
        setting.padding = v;
    }
    if let Some(v) = cli.pow2 {
        setting.power_of_two = v;
    }
    if let Some(v) = cli.square {
        setting.force_square = v;
    }

    let start = Instant::now();
    let mut canvas = ProgressCanvas::new(sprites.len(), show_progress)?;
    let atlas = AtlasPacker::new(setting).repack(&previous, &sprites, &mut canvas)?;
    let bins = canvas.finish();
    report(&atlas, start);

    if !cli.dry_run {
        let out_dir = cli.out_dir.clone().unwrap_or(dir);
        write_atlas(&out_dir, &name, &atlas, &bins)?;
    }
    Ok(())
}

fn run_stats(cli: &StatsArgs) -> anyhow::Result<()> {
    let (atlas, name) = read_atlas(&cli.atlas)?;
    let stats = atlas.stats();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("atlas {} (id {})", name, atlas.id);
    for (i, bin) in atlas.bins.iter().enumerate() {
        println!(
            "  {}  {} sprites",
            bin.display_name(&format!("{}_{}", name, i)),
            bin.sprites.len()
        );
    }
    println!("{}", stats.summary());
    println!("Wasted: {} px² ({:.2}%)", stats.wasted_area(), stats.waste_percentage());
    Ok(())
}

fn report(atlas: &AtlasDescription, start: Instant) {
    let stats = atlas.stats();
    info!(
        bins = stats.num_bins,
        sprites = stats.num_sprites,
        occupancy = %format!("{:.2}%", stats.occupancy * 100.0),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "packed"
    );
    for (i, bin) in atlas.bins.iter().enumerate() {
        info!(bin = i, width = bin.width, height = bin.height, quality = %bin.quality, transparent = bin.transparent, "bin");
    }
}

fn bin_file_name(name: &str, index: usize) -> String {
    format!("{}_{}.png", name, index)
}

fn write_atlas(
    out_dir: &Path,
    name: &str,
    atlas: &AtlasDescription,
    bins: &[RgbaImage],
) -> anyhow::Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("create out_dir {}", out_dir.display()))?;
    for (i, rgba) in bins.iter().enumerate() {
        let png_path = out_dir.join(bin_file_name(name, i));
        rgba.save(&png_path)
            .with_context(|| format!("write {}", png_path.display()))?;
        info!(?png_path, bin = i, "wrote bin");
    }
    let json_path = out_dir.join(format!("{}.json", name));
    let json = serde_json::to_string_pretty(atlas)?;
    fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
    info!(?json_path, bins = atlas.bins.len(), "atlas written");
    Ok(())
}

fn read_atlas(path: &Path) -> anyhow::Result<(AtlasDescription, String)> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let atlas: AtlasDescription =
        serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("atlas")
        .to_string();
    Ok((atlas, name))
}

/// Glob rules matched against sprite names; the last matching rule wins.
struct Rules {
    set: GlobSet,
    tiers: Vec<QualityTier>,
}

impl Rules {
    fn quality_of(&self, name: &str) -> Option<QualityTier> {
        self.set
            .matches(name)
            .into_iter()
            .max()
            .map(|i| self.tiers[i])
    }
}

fn build_rules(rules: &[QualityRule]) -> anyhow::Result<Rules> {
    let mut b = GlobSetBuilder::new();
    for rule in rules {
        b.add(Glob::new(&rule.pattern).with_context(|| format!("bad rule {}", rule.pattern))?);
    }
    Ok(Rules {
        set: b.build()?,
        tiers: rules.iter().map(|r| r.quality).collect(),
    })
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    // Build glob matchers
    let mut inc_set = None;
    if !include.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in include {
            b.add(Glob::new(pat)?);
        }
        inc_set = Some(b.build()?);
    }
    let mut exc_set = None;
    if !exclude.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in exclude {
            b.add(Glob::new(pat)?);
        }
        exc_set = Some(b.build()?);
    }
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        return !inc.is_match(&s);
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("png" | "jpg" | "jpeg")
    )
}

/// Sprite name: path relative to `root` without extension, `/`-separated.
fn sprite_name(root: &Path, p: &Path) -> String {
    let rel = p.strip_prefix(root).unwrap_or(p);
    let rel = if rel.as_os_str().is_empty() {
        Path::new(p.file_name().unwrap_or(p.as_os_str()))
    } else {
        rel
    };
    rel.with_extension("").to_string_lossy().replace('\\', "/")
}

fn load_sprites_with_progress(
    root: &Path,
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<Vec<ImageSprite>> {
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
            )
            .context("progress template")?,
        );
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(rgba) => list.push(ImageSprite::new(sprite_name(root, p), rgba)),
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<RgbaImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img.to_rgba8())
}

/// RGBA canvas that ticks a progress bar for every sprite copied.
struct ProgressCanvas {
    inner: RgbaCanvas,
    bar: Option<ProgressBar>,
}

impl ProgressCanvas {
    fn new(total: usize, progress: bool) -> anyhow::Result<Self> {
        let bar = if progress {
            let b = ProgressBar::new(total as u64);
            b.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} packing {pos}/{len} [{elapsed_precise}] {wide_msg}",
                )
                .context("progress template")?,
            );
            Some(b)
        } else {
            None
        };
        Ok(Self {
            inner: RgbaCanvas::new(),
            bar,
        })
    }

    fn finish(self) -> Vec<RgbaImage> {
        if let Some(b) = &self.bar {
            b.finish_and_clear();
        }
        self.inner.into_bins()
    }
}

impl BinCanvas for ProgressCanvas {
    fn create_bin(&mut self, index: usize, bin: &AtlasBin) -> AtlasResult<()> {
        if let Some(b) = &self.bar {
            b.set_message(format!("bin {} [{}x{}]", index, bin.width, bin.height));
        }
        self.inner.create_bin(index, bin)
    }

    fn blit(&mut self, bin: usize, rect: Rect, pixels: &RgbaImage) -> AtlasResult<()> {
        self.inner.blit(bin, rect, pixels).inspect_err(|e| {
            if matches!(e, AtlasError::Cancelled) {
                warn!("packing cancelled");
            }
        })?;
        if let Some(b) = &self.bar {
            b.inc(1);
        }
        Ok(())
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
