use clap::{Parser, Subcommand};
use gabarito::models::Verdict;
use gabarito::utils::binarization::{adaptive_binarize, otsu_binarize};
use gabarito::utils::grayscale::rgb_to_grayscale;
use gabarito::{AnswerKey, Choice, Grader, compare_answers};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheettool", version, about = "Gabarito answer sheet CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a sheet photo and print the detected answers
    Scan {
        #[arg(long)]
        image: PathBuf,
        /// Number of questions printed on the sheet
        #[arg(long)]
        questions: usize,
        /// Write the annotated rectified sheet to this path
        #[arg(long)]
        annotated: Option<PathBuf>,
        /// Print the answer map as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Scan a sheet and grade it against an answer key
    Grade {
        #[arg(long)]
        image: PathBuf,
        /// Answer key as one letter per question, e.g. ABCDE
        #[arg(long)]
        key: String,
    },
    /// Print binarization stats and marker candidates for an image
    DebugDetect {
        #[arg(long)]
        image: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Scan {
            image,
            questions,
            annotated,
            json,
        } => scan_cmd(&image, questions, annotated.as_deref(), json),
        Command::Grade { image, key } => grade_cmd(&image, &key),
        Command::DebugDetect { image } => debug_detect_cmd(&image),
    }
}

fn load_rgb(path: &Path) -> Result<(Vec<u8>, usize, usize), image::ImageError> {
    let img = image::open(path)?.to_rgb8();
    let (width, height) = (img.width() as usize, img.height() as usize);
    Ok((img.into_raw(), width, height))
}

fn scan_cmd(path: &Path, questions: usize, annotated: Option<&Path>, json: bool) {
    let (pixels, width, height) = match load_rgb(path) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("Failed to load image {}: {}", path.display(), err);
            std::process::exit(1);
        }
    };

    let grader = Grader::from_env();
    let start = Instant::now();
    let result = match grader.grade(&pixels, width, height, questions) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("Scan failed: {err}");
            std::process::exit(1);
        }
    };
    let elapsed = start.elapsed();

    if json {
        match serde_json::to_string_pretty(&*result) {
            Ok(out) => println!("{out}"),
            Err(err) => eprintln!("Failed to serialize result: {err}"),
        }
    } else {
        println!("Image: {} ({}x{})", path.display(), width, height);
        println!("Scanned {} questions in {:.2?}", result.total_questions, elapsed);
        for (question, verdict) in result.answers.iter() {
            println!("  {:>3}: {}", question, verdict);
        }
        let ambiguous = result
            .answers
            .iter()
            .filter(|(_, v)| *v == Verdict::Ambiguous)
            .count();
        if ambiguous > 0 {
            println!("{ambiguous} questions were ambiguous");
        }
    }

    if let Some(out) = annotated {
        let img = &result.annotated;
        let buffer: Option<image::RgbImage> =
            image::RgbImage::from_raw(img.width as u32, img.height as u32, img.rgb.clone());
        match buffer {
            Some(buffer) => {
                if let Err(err) = buffer.save(out) {
                    eprintln!("Failed to save {}: {}", out.display(), err);
                } else {
                    println!("Annotated sheet written to {}", out.display());
                }
            }
            None => eprintln!("Annotated buffer has inconsistent dimensions"),
        }
    }
}

fn grade_cmd(path: &Path, key: &str) {
    let mut answer_key = AnswerKey::new();
    for (i, c) in key.chars().enumerate() {
        match Choice::from_char(c) {
            Some(choice) => {
                answer_key.insert(i as u32 + 1, choice);
            }
            None => {
                eprintln!("Invalid answer key letter '{c}' at position {}", i + 1);
                std::process::exit(1);
            }
        }
    }
    if answer_key.is_empty() {
        eprintln!("Answer key is empty");
        std::process::exit(1);
    }

    let (pixels, width, height) = match load_rgb(path) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("Failed to load image {}: {}", path.display(), err);
            std::process::exit(1);
        }
    };

    let grader = Grader::from_env();
    let result = match grader.grade(&pixels, width, height, answer_key.len()) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("Scan failed: {err}");
            std::process::exit(1);
        }
    };

    let report = compare_answers(&result.answers, &answer_key);
    println!("Image: {} ({}x{})", path.display(), width, height);
    println!(
        "Score: {}/{} = {:.1}%",
        report.correct, report.total, report.score
    );
    for outcome in &report.details {
        let detected = outcome
            .detected
            .map(|v| v.to_string())
            .unwrap_or_else(|| "missing".to_string());
        println!(
            "  {:>3}: detected={} expected={} {}",
            outcome.question,
            detected,
            outcome.expected,
            if outcome.correct { "ok" } else { "X" }
        );
    }
}

fn debug_detect_cmd(path: &Path) {
    let (pixels, width, height) = match load_rgb(path) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("Failed to load image {}: {}", path.display(), err);
            std::process::exit(1);
        }
    };

    println!("Image: {} ({}x{})", path.display(), width, height);

    let gray = rgb_to_grayscale(&pixels, width, height);
    let global = otsu_binarize(&gray, width, height);
    let local = adaptive_binarize(&gray, width, height, 25, 5);
    let total = width * height;
    println!(
        "Otsu: {} dark of {} ({:.2}%)",
        global.count_set(),
        total,
        global.count_set() as f64 / total as f64 * 100.0
    );
    println!(
        "Adaptive: {} dark of {} ({:.2}%)",
        local.count_set(),
        total,
        local.count_set() as f64 / total as f64 * 100.0
    );

    let config = gabarito::ScanConfig::from_env();
    match gabarito::detector::marker::locate_markers(&gray, width, height, &config.marker) {
        Ok(markers) => {
            println!("Found {} marker candidates", markers.len());
            for (i, m) in markers.iter().enumerate() {
                println!(
                    "  Marker {}: center=({:.1}, {:.1}) area={} role={:?}",
                    i, m.centroid.x, m.centroid.y, m.area, m.role
                );
            }
        }
        Err(err) => println!("Marker detection failed: {err}"),
    }
}
