//! CLI command implementations.

use std::path::PathBuf;
use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::engine::{registry, TesseractEngine};
use crate::pipeline::{ExtractionPipeline, ExtractionResult, InputFile};
use crate::raster::PopplerRasterizer;

pub struct ExtractArgs {
    pub files: Vec<PathBuf>,
    pub out: Option<PathBuf>,
    pub json: bool,
    pub scale: Option<f32>,
    pub psm: Option<String>,
    pub oem: Option<String>,
    pub whitelist: Option<String>,
    pub preserve_spaces: bool,
}

/// Extract text from a batch of files, one at a time.
pub async fn cmd_extract(settings: Settings, args: ExtractArgs) -> anyhow::Result<()> {
    let mut params = settings.recognition.clone();
    if let Some(psm) = &args.psm {
        params.segmentation = psm.parse()?;
    }
    if let Some(oem) = &args.oem {
        params.engine_mode = oem.parse()?;
    }
    if let Some(whitelist) = args.whitelist {
        params.char_whitelist = Some(whitelist);
    }
    if args.preserve_spaces {
        params.preserve_interword_spaces = true;
    }
    let scale = args.scale.unwrap_or(settings.raster_scale);

    let engine = TesseractEngine::new(&settings.language).await?;
    let pipeline = ExtractionPipeline::new(Arc::new(engine), Arc::new(PopplerRasterizer::new()))
        .with_params(params)
        .with_raster_scale(scale);

    if let Some(dir) = &args.out {
        std::fs::create_dir_all(dir)?;
    }

    let total = args.files.len();
    let mut results: Vec<ExtractionResult> = Vec::new();
    let mut failed = 0usize;

    for (index, path) in args.files.iter().enumerate() {
        let input = match InputFile::from_path(path) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("{} {}: {}", style("✗").red(), path.display(), e);
                failed += 1;
                continue;
            }
        };

        println!(
            "{} [{}/{}] {}",
            style("→").cyan(),
            index + 1,
            total,
            input.name
        );

        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  [{bar:30.cyan/blue}] {pos:>3}%")
                .unwrap()
                .progress_chars("█▓░"),
        );
        let bar_sink = bar.clone();

        let outcome = pipeline
            .process_with_progress(&input, move |pct| bar_sink.set_position(pct.round() as u64))
            .await;
        bar.finish_and_clear();

        match outcome {
            Ok(result) => {
                println!(
                    "  {} {} page(s), {} characters",
                    style("✓").green(),
                    result.pages,
                    result.text.chars().count()
                );

                if let Some(dir) = &args.out {
                    let stem = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| result.file_name.clone());
                    let dest = dir.join(format!("{stem}.txt"));
                    std::fs::write(&dest, &result.text)?;
                    println!("  {} wrote {}", style("✓").green(), dest.display());
                } else if !args.json {
                    println!("{}", result.text);
                }
                results.push(result);
            }
            Err(e) => {
                tracing::warn!("extraction failed for {}: {}", input.name, e);
                eprintln!("  {} {}: {}", style("✗").red(), input.name, e);
                failed += 1;
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    if failed > 0 {
        println!(
            "{} {} of {} files failed",
            style("!").yellow(),
            failed,
            total
        );
        anyhow::bail!("{failed} of {total} files failed");
    }
    Ok(())
}

/// Report recognition tool availability.
pub async fn cmd_check() -> anyhow::Result<()> {
    println!("\n{}", style("Recognition Tool Status").bold());
    println!("{}", "-".repeat(50));

    let mut tools = vec![("tesseract", TesseractEngine::binary_available())];
    tools.extend(PopplerRasterizer::check_tools());

    let mut all_found = true;
    for (tool, available) in &tools {
        let status = if *available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    if TesseractEngine::binary_available() {
        match registry::acquire().await {
            Ok(handle) => {
                println!(
                    "\n  {} languages installed ({})",
                    handle.languages().len(),
                    handle.languages().join(", ")
                );
                if !handle.has_language("eng") {
                    println!(
                        "  {} 'eng' profile missing (install tesseract-ocr-eng)",
                        style("!").yellow()
                    );
                }
            }
            Err(e) => println!("  {} engine probe failed: {}", style("!").yellow(), e),
        }
    }

    println!();
    if all_found {
        println!("{} All recognition tools are available", style("✓").green());
    } else {
        println!(
            "{} Some tools are missing. Install them for full support:",
            style("!").yellow()
        );
        println!("  - pdftoppm, pdfinfo: poppler-utils package");
        println!("  - tesseract: tesseract-ocr package");
    }

    Ok(())
}
