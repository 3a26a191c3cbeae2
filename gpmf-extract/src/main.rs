use std::{
    io::{BufWriter, Write},
    path::PathBuf,
    sync::atomic::Ordering,
};

use clap::Parser;
use gpmf_extract::{
    ExtractConfig, ExtractError, ExtractSession, OutputFormat, PayloadSource, RawGpmfSource,
    RowEmitter,
};
use gpmf_types::{FourCC, GpmfError};
use log::{error, info, warn, LevelFilter};

#[derive(Parser, Debug)]
#[command(
    name = "gpmf-extract",
    version = env!("CARGO_PKG_VERSION"),
    about = "Extract time-stamped GPS rows from a raw GPMF stream",
    long_about = None,
)]
struct Cli {
    /// Сырой поток GPMF (ffmpeg -i clip.mp4 -map 0:3 -c copy -f data gpmf.bin)
    input: PathBuf,
    /// Длительность одной полезной нагрузки, секунды
    #[arg(long, default_value = "1.0")]
    payload_secs: f64,
    /// Запись данных для вывода
    #[arg(short = 'f', long, default_value = "GPS5")]
    fourcc: String,
    /// Контейнер потока
    #[arg(long, default_value = "STRM")]
    stream: String,
    /// Не дописывать единицы измерения
    #[arg(long)]
    no_units: bool,
    /// Логировать номер полезной нагрузки
    #[arg(short = 'i', long)]
    show_index: bool,
    /// Логировать временное окно полезной нагрузки
    #[arg(short = 't', long)]
    show_time: bool,
    /// Выводить дерево записей каждой полезной нагрузки
    #[arg(short = 'g', long)]
    structure: bool,
    /// Строка заголовка CSV
    #[arg(long)]
    header: bool,
    /// Формат вывода: csv, json
    #[arg(long, default_value = "csv")]
    format: String,
    /// То же, что --format json
    #[arg(long)]
    json: bool,
    /// Тихий режим (только ошибки)
    #[arg(short, long)]
    quiet: bool,
    /// Подробный журнал обхода
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
}

fn parse_fourcc(
    flag: &str,
    s: &str,
) -> FourCC {
    match s.parse() {
        Ok(f) => f,
        Err(e) => {
            error!("{flag}: {e}");
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => LevelFilter::Error,
        (_, true) => LevelFilter::Debug,
        _ => LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let format = if cli.json {
        OutputFormat::JsonLines
    } else {
        match cli.format.parse() {
            Ok(f) => f,
            Err(e) => {
                error!("--format: {e}");
                std::process::exit(1);
            }
        }
    };

    let config = ExtractConfig {
        target: parse_fourcc("--fourcc", &cli.fourcc),
        stream: parse_fourcc("--stream", &cli.stream),
        show_units: !cli.no_units,
        show_payload_index: cli.show_index,
        show_payload_time: cli.show_time,
        show_structure: cli.structure,
        format,
    };

    let mut source = match RawGpmfSource::open(&cli.input, cli.payload_secs) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open {:?}: {e}", cli.input);
            std::process::exit(1);
        }
    };

    let session = match ExtractSession::new(config) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let stop_ctrlc = session.stop_flag();
    if let Err(e) = ctrlc::set_handler(move || {
        if stop_ctrlc.swap(true, Ordering::SeqCst) {
            // Второй Ctrl+C: принудительный выход
            warn!("Force exit");
            std::process::exit(130);
        }
        warn!("Ctrl+C received, finishing current payload...");
    }) {
        warn!("Failed to set Ctrl+C handler: {e}");
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Input         : {:?}", cli.input);
    info!("  Payloads      : {}", source.payload_count());
    info!("  Duration      : {:.2}s", source.duration());
    info!("  Target        : {}/{}", session.config().stream, session.config().target);
    info!("  Format        : {}", session.config().format);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if cli.header && session.config().format == OutputFormat::Csv {
        let header = RowEmitter::new(session.config()).csv_header();
        if let Err(e) = writeln!(out, "{header}") {
            error!("{e}");
            std::process::exit(1);
        }
    }

    let result = session.run(&mut source, &mut out);

    if let Err(e) = out.flush() {
        error!("Failed to flush output: {e}");
        std::process::exit(1);
    }

    let stats = match result {
        Ok(s) => s,
        Err(ExtractError::Gpmf(GpmfError::UnknownType(code))) => {
            error!("Unknown GPMF Type within {:?} (type 0x{code:02x})", cli.input);
            std::process::exit(2);
        }
        Err(e) => {
            error!("Extraction failed: {e}");
            std::process::exit(1);
        }
    };

    // --- Итоговая статистика ---
    info!("\n{stats}");

    if stats.has_corruption() {
        error!(
            "GPMF data has corruption: {} of {} payloads aborted",
            stats.payloads_corrupted, stats.payloads_total
        );
        std::process::exit(3);
    }
}
