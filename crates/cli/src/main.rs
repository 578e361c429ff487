use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use facematch_core::comparison::domain::face_comparator::FaceComparator;
use facematch_core::comparison::domain::gallery_store::GalleryStore;
use facematch_core::comparison::infrastructure::json_gallery_store::JsonGalleryStore;
use facematch_core::detection::domain::face_detector::FaceDetector;
use facematch_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use facematch_core::embedding::domain::embedding_provider::EmbeddingProvider;
use facematch_core::embedding::infrastructure::onnx_embedding_provider::OnnxEmbeddingProvider;
use facematch_core::imaging::domain::image_loader::ImageLoader;
use facematch_core::imaging::domain::image_source::ImageSource;
use facematch_core::imaging::infrastructure::image_file_loader::ImageFileLoader;
use facematch_core::pipeline::compare_faces_use_case::CompareFacesUseCase;
use facematch_core::pipeline::comparison_error::ComparisonError;
use facematch_core::pipeline::comparison_report::ComparisonReport;
use facematch_core::pipeline::detect_faces_use_case::DetectFacesUseCase;
use facematch_core::pipeline::enroll_face_use_case::EnrollFaceUseCase;
use facematch_core::pipeline::forget_face_use_case::ForgetFaceUseCase;
use facematch_core::pipeline::identify_face_use_case::IdentifyFaceUseCase;
use facematch_core::pipeline::pipeline_config::PipelineConfig;
use facematch_core::pipeline::pipeline_logger::{LogPipelineLogger, PipelineLogger};
use facematch_core::shared::constants::{DETECTOR_MODEL, EMBEDDING_MODEL};
use facematch_core::shared::model_resolver::{self, ModelSpec};

/// Face comparison and identification for still images.
#[derive(Parser)]
#[command(name = "facematch")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Decide whether two images show the same person.
    Compare {
        /// First image: path, file:// URI, data URI or http(s) URL.
        first: String,
        /// Second image.
        second: String,
        /// Print the result (or error) as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List every face found in an image.
    Detect {
        image: String,
        /// Include five-point landmarks.
        #[arg(long)]
        landmarks: bool,
        /// Assign tracking ids to faces.
        #[arg(long)]
        tracking: bool,
        #[arg(long)]
        json: bool,
    },
    /// Add a named reference face to the gallery.
    Enroll {
        /// Name to register the face under.
        #[arg(long)]
        name: String,
        /// Explicit user id (default: next free number).
        #[arg(long)]
        user_id: Option<String>,
        image: String,
    },
    /// Name the face in an image using the gallery.
    Identify {
        image: String,
        #[arg(long)]
        json: bool,
    },
    /// Remove a face from the gallery.
    Forget {
        /// Name to remove.
        #[arg(required_unless_present = "all")]
        name: Option<String>,
        /// Remove every enrolled face.
        #[arg(long)]
        all: bool,
    },
}

#[derive(Args)]
struct PipelineArgs {
    /// JSON config file (default: the user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Match when the embedding distance is below this value.
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, global = true)]
    confidence: Option<f64>,

    /// Smallest face to keep, as a fraction of image width (0.0-1.0).
    #[arg(long, global = true)]
    min_face_size: Option<f64>,

    /// Directory searched for model files before the download cache.
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Gallery file (default: the user data directory).
    #[arg(long, global = true)]
    gallery: Option<PathBuf>,

    /// Refuse http(s) image sources.
    #[arg(long, global = true)]
    offline: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let args = cli.pipeline;

    match cli.command {
        Command::Compare {
            first,
            second,
            json,
        } => run_compare(&args, &first, &second, json),
        Command::Detect {
            image,
            landmarks,
            tracking,
            json,
        } => run_detect(&args, &image, landmarks, tracking, json),
        Command::Enroll {
            name,
            user_id,
            image,
        } => run_enroll(&args, &name, user_id.as_deref(), &image),
        Command::Identify { image, json } => run_identify(&args, &image, json),
        Command::Forget { name, all } => run_forget(&args, name.as_deref(), all),
    }
}

fn run_compare(
    args: &PipelineArgs,
    first: &str,
    second: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = load_config(args).and_then(|config| {
        let mut use_case = CompareFacesUseCase::new(
            build_loader(args),
            build_detector(&config)?,
            build_embedder(&config)?,
            FaceComparator::new(config.threshold),
            config.detection.clone(),
            build_logger(),
        );
        use_case.execute(&ImageSource::parse(first), &ImageSource::parse(second))
    });

    if json {
        let report = ComparisonReport::from(outcome);
        println!("{}", serde_json::to_string_pretty(&report)?);
        if report.is_error() {
            process::exit(1);
        }
        return Ok(());
    }

    let result = outcome?;
    println!("Match: {}", if result.is_match { "yes" } else { "no" });
    println!("Similarity: {}", result.similarity);
    println!("Distance: {:.4}", result.distance);
    Ok(())
}

fn run_detect(
    args: &PipelineArgs,
    image: &str,
    landmarks: bool,
    tracking: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(args)?;
    config.detection.landmarks = landmarks;
    config.detection.tracking = tracking;

    let mut use_case = DetectFacesUseCase::new(
        build_loader(args),
        build_detector(&config)?,
        config.detection.clone(),
        build_logger(),
    );
    let faces = use_case.execute(&ImageSource::parse(image))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&faces)?);
        return Ok(());
    }

    println!("{} face(s)", faces.len());
    for (i, face) in faces.iter().enumerate() {
        let b = face.bounding_box;
        let id = face
            .tracking_id
            .map(|id| format!(" id={id}"))
            .unwrap_or_default();
        println!(
            "  #{}: left={} top={} width={} height={} confidence={:.2}{id}",
            i + 1,
            b.left,
            b.top,
            b.width,
            b.height,
            face.confidence
        );
    }
    Ok(())
}

fn run_enroll(
    args: &PipelineArgs,
    name: &str,
    user_id: Option<&str>,
    image: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    let mut use_case = EnrollFaceUseCase::new(
        build_loader(args),
        build_detector(&config)?,
        build_embedder(&config)?,
        build_store(args)?,
        config.detection.clone(),
        build_logger(),
    );
    let entry = use_case.execute(name, user_id, &ImageSource::parse(image))?;
    println!("Enrolled {} (user id {})", entry.name, entry.user_id);
    Ok(())
}

fn run_identify(
    args: &PipelineArgs,
    image: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    let mut use_case = IdentifyFaceUseCase::new(
        build_loader(args),
        build_detector(&config)?,
        build_embedder(&config)?,
        build_store(args)?,
        FaceComparator::new(config.threshold),
        config.detection.clone(),
        build_logger(),
    );
    let identification = use_case.execute(&ImageSource::parse(image))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&identification)?);
    } else {
        println!("Name: {}", identification.name);
        println!("Similarity: {}", identification.similarity);
    }
    Ok(())
}

fn run_forget(
    args: &PipelineArgs,
    name: Option<&str>,
    all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let use_case = ForgetFaceUseCase::new(build_store(args)?);
    if all {
        let count = use_case.clear()?;
        println!("Removed {count} face(s)");
        return Ok(());
    }

    let name = name.ok_or("a name or --all is required")?;
    if use_case.execute(name)? {
        println!("Removed {name}");
        Ok(())
    } else {
        Err(format!("{name} is not enrolled").into())
    }
}

/// Config file first, then command-line overrides.
fn load_config(args: &PipelineArgs) -> Result<PipelineConfig, ComparisonError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::load_or_default()?,
    };
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(confidence) = args.confidence {
        config.detection.confidence = confidence;
    }
    if let Some(min_face_size) = args.min_face_size {
        config.detection.min_face_size = min_face_size;
    }
    if let Some(dir) = &args.model_dir {
        config.model_dir = Some(dir.clone());
    }
    config.validate()?;
    Ok(config)
}

fn build_loader(args: &PipelineArgs) -> Box<dyn ImageLoader> {
    Box::new(ImageFileLoader::new().with_network(!args.offline))
}

fn build_detector(config: &PipelineConfig) -> Result<Box<dyn FaceDetector>, ComparisonError> {
    let model_path = resolve_model(&DETECTOR_MODEL, config)?;
    let detector = OnnxYoloDetector::new(&model_path).map_err(|e| {
        ComparisonError::Prepare(format!("cannot load face detector: {e}"))
    })?;
    Ok(Box::new(detector))
}

fn build_embedder(
    config: &PipelineConfig,
) -> Result<Box<dyn EmbeddingProvider>, ComparisonError> {
    let model_path = match &config.embedding_model {
        Some(path) => path.clone(),
        None => resolve_model(&EMBEDDING_MODEL, config)?,
    };
    let embedder = OnnxEmbeddingProvider::new(&model_path, config.embedding.clone())
        .map_err(|e| ComparisonError::Prepare(format!("cannot load embedding model: {e}")))?;
    Ok(Box::new(embedder))
}

fn build_store(args: &PipelineArgs) -> Result<Box<dyn GalleryStore>, ComparisonError> {
    let store = match &args.gallery {
        Some(path) => JsonGalleryStore::new(path),
        None => JsonGalleryStore::default_location().ok_or_else(|| {
            ComparisonError::Prepare("could not determine gallery location".to_string())
        })?,
    };
    log::debug!("Using gallery {}", store.path().display());
    Ok(Box::new(store))
}

fn build_logger() -> Box<dyn PipelineLogger> {
    Box::new(LogPipelineLogger::new())
}

fn resolve_model(spec: &ModelSpec, config: &PipelineConfig) -> Result<PathBuf, ComparisonError> {
    log::info!("Resolving model: {}", spec.name);
    let name = spec.name;
    let path = model_resolver::resolve(
        spec,
        config.model_dir.as_deref(),
        Some(Box::new(move |downloaded, total| {
            download_progress(name, downloaded, total)
        })),
    )
    .map_err(|e| ComparisonError::Prepare(e.to_string()))?;
    Ok(path)
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}
