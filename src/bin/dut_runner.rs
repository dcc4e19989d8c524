//! Command-line entry point: runs a test script against a device under test.
//!
//! The device is reached either through a character device or FIFO that is
//! already configured (baud rate, framing) or through a TCP bridge.

use std::fs::OpenOptions;
use std::io::BufReader;
use std::net::TcpStream;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use dut_bench::result_aggregator::{AggregationConfig, AucSource, ZeroSumPolicy};
use dut_bench::runner::{RunnerConfig, RunnerError, RunnerResult, TestRunner};
use dut_bench::transport::{DEFAULT_END_MARKER, DEFAULT_TERMINATOR};
use dut_bench::{DeviceUnderTest, LineTransport, TestMode, Transport};
use log::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Accuracy and AUC
    #[value(name = "a", alias = "accuracy")]
    Accuracy,
    /// Throughput
    #[value(name = "p", alias = "performance")]
    Performance,
    /// Energy (needs a power instrument, not available from this binary)
    #[value(name = "e", alias = "energy")]
    Energy,
}

impl From<ModeArg> for TestMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Accuracy => TestMode::Accuracy,
            ModeArg::Performance => TestMode::Performance,
            ModeArg::Energy => TestMode::Energy,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ZeroSumArg {
    Abort,
    Skip,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AucSourceArg {
    First,
    Mean,
}

/// Runs inference benchmarks on a device under test
#[derive(Parser, Debug)]
#[command(name = "dut-runner")]
#[command(version)]
#[command(about = "Executes test scripts on a device under test and scores the results")]
struct Cli {
    /// Character device or FIFO connected to the DUT
    #[arg(short = 'p', long, conflicts_with = "tcp", required_unless_present = "tcp")]
    device: Option<PathBuf>,

    /// TCP address of a bridge to the DUT (host:port)
    #[arg(long)]
    tcp: Option<String>,

    /// JSON file with test scripts keyed by model name
    #[arg(short, long, default_value = "tests.json")]
    test_script: PathBuf,

    /// Optional JSON file with DUT settings
    #[arg(short = 'u', long)]
    dut_config: Option<PathBuf>,

    /// Dataset root directory
    #[arg(short = 's', long, default_value = "datasets")]
    dataset_path: PathBuf,

    /// Test mode
    #[arg(short, long, value_enum, default_value = "a")]
    mode: ModeArg,

    /// Line the device prints when it is ready for the next command
    #[arg(long, default_value = DEFAULT_END_MARKER)]
    end_marker: String,

    /// Delimiter appended to every command
    #[arg(long, default_value = DEFAULT_TERMINATOR)]
    terminator: String,

    /// What to do with multi-class results that sum to zero
    #[arg(long, value_enum, default_value = "abort")]
    zero_sum: ZeroSumArg,

    /// Probability vector used per file for AUC
    #[arg(long, value_enum, default_value = "first")]
    auc_source: AucSourceArg,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("Test run failed: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> RunnerResult<()> {
    let mode: TestMode = cli.mode.into();
    if mode == TestMode::Energy {
        return Err(RunnerError::ConfigValidationError {
            field: "mode".to_string(),
            message: "energy mode needs a power instrument, none is attached by dut-runner"
                .to_string(),
        });
    }

    let transport = open_transport(&cli)?;
    let mut dut = DeviceUnderTest::new(transport, None);

    let config = RunnerConfig {
        test_script_path: cli.test_script,
        dut_config_path: cli.dut_config,
        dataset_path: cli.dataset_path,
        mode,
        voltage_mv: None,
        aggregation: AggregationConfig {
            zero_sum_policy: match cli.zero_sum {
                ZeroSumArg::Abort => ZeroSumPolicy::Abort,
                ZeroSumArg::Skip => ZeroSumPolicy::Skip,
            },
            auc_source: match cli.auc_source {
                AucSourceArg::First => AucSource::FirstVote,
                AucSourceArg::Mean => AucSource::MeanVote,
            },
        },
    };

    let report = TestRunner::new(config).run(&mut dut)?;
    println!("{}", report);
    Ok(())
}

fn open_transport(cli: &Cli) -> std::io::Result<Box<dyn Transport>> {
    let transport: Box<dyn Transport> = match (&cli.device, &cli.tcp) {
        (Some(path), _) => {
            info!("Opening DUT device {}", path.display());
            let writer = OpenOptions::new().read(true).write(true).open(path)?;
            let reader = BufReader::new(writer.try_clone()?);
            Box::new(
                LineTransport::new(reader, writer)
                    .with_end_marker(cli.end_marker.clone())
                    .with_terminator(cli.terminator.clone()),
            )
        }
        (None, Some(address)) => {
            info!("Connecting to DUT bridge at {}", address);
            let writer = TcpStream::connect(address)?;
            let reader = BufReader::new(writer.try_clone()?);
            Box::new(
                LineTransport::new(reader, writer)
                    .with_end_marker(cli.end_marker.clone())
                    .with_terminator(cli.terminator.clone()),
            )
        }
        (None, None) => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "either --device or --tcp is required",
            ));
        }
    };
    Ok(transport)
}
