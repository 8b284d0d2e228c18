use anyhow::{anyhow, bail, Context};
use crabshot::{
    CameraCapability, CameraSessionController, CrabshotConfig, LensFacing, NokhwaCapability,
    QualityPreset, SessionState,
};
use std::env;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crabshot::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: crabshot-cli <list-devices|capture|switch-capture> [args]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "list-devices" => cmd_list_devices(&args).await,
        "capture" => cmd_capture(&args, false).await,
        "switch-capture" => cmd_capture(&args, true).await,
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

async fn cmd_list_devices(args: &[String]) -> anyhow::Result<()> {
    let devices = NokhwaCapability::default().enumerate_devices().await;
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&devices)?);
    } else if devices.is_empty() {
        println!("No cameras found");
    } else {
        for d in devices {
            println!("{}: {} ({})", d.id, d.name, d.facing.as_str());
        }
    }
    Ok(())
}

/// Options shared by `capture` and `switch-capture`
#[derive(Debug, Default, PartialEq)]
struct CaptureArgs {
    config_path: Option<PathBuf>,
    preset: Option<QualityPreset>,
    facing: Option<LensFacing>,
    output: Option<PathBuf>,
    json: bool,
}

impl CaptureArgs {
    // [--config <path>] [--preset <p>] [--facing <f>] [--output <dir>] [--json]
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut parsed = Self::default();
        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => parsed.config_path = Some(PathBuf::from(value_of(args, &mut i)?)),
                "--preset" => {
                    parsed.preset = Some(
                        value_of(args, &mut i)?
                            .parse::<QualityPreset>()
                            .map_err(|e| anyhow!(e))?,
                    )
                }
                "--facing" => parsed.facing = Some(parse_facing(value_of(args, &mut i)?)?),
                "--output" => parsed.output = Some(PathBuf::from(value_of(args, &mut i)?)),
                "--json" => parsed.json = true,
                other => bail!("Unknown argument: {}", other),
            }
            i += 1;
        }
        Ok(parsed)
    }

    fn load_config(&self) -> anyhow::Result<CrabshotConfig> {
        let mut config = match &self.config_path {
            Some(path) => CrabshotConfig::load_from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => CrabshotConfig::load_or_default(),
        };
        if let Some(preset) = self.preset {
            config.camera.quality_preset = preset;
        }
        if self.facing.is_some() {
            config.camera.preferred_facing = self.facing;
        }
        if let Some(output) = &self.output {
            config.storage.output_directory = output.clone();
        }
        config.validate().map_err(|e| anyhow!(e))?;
        Ok(config)
    }
}

async fn cmd_capture(args: &[String], switch: bool) -> anyhow::Result<()> {
    let opts = CaptureArgs::parse(args)?;
    let config = opts.load_config()?;

    let controller =
        CameraSessionController::from_config(NokhwaCapability::from_config(&config), &config);

    let outcome = run_capture(&controller, switch).await;
    controller.dispose().await;
    let photo = outcome?;

    if opts.json {
        println!("{}", serde_json::to_string(&photo)?);
    } else {
        println!("Saved {}x{} photo to {}", photo.width, photo.height, photo.path.display());
    }
    Ok(())
}

async fn run_capture(
    controller: &CameraSessionController<NokhwaCapability>,
    switch: bool,
) -> anyhow::Result<crabshot::CaptureArtifact> {
    let mut state = controller.initialize().await;
    if switch {
        state = controller.switch_device().await?;
    }

    match state {
        SessionState::Ready(device) => log::info!("Capturing from {} ({})", device.name, device.id),
        SessionState::Failed(e) => return Err(e.into()),
        other => bail!("Camera did not become ready: {}", other.as_str()),
    }

    match controller.capture().await {
        Some(result) => Ok(result?),
        None => bail!("Capture was skipped"),
    }
}

fn value_of<'a>(args: &'a [String], i: &mut usize) -> anyhow::Result<&'a str> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing value for {}", args[*i - 1]))
}

fn parse_facing(s: &str) -> anyhow::Result<LensFacing> {
    match s {
        "front" => Ok(LensFacing::Front),
        "back" => Ok(LensFacing::Back),
        "external" => Ok(LensFacing::External),
        _ => bail!("Invalid facing: {} (expected front, back or external)", s),
    }
}
