use std::path::PathBuf;
use std::str::FromStr;
use std::convert::TryFrom;
use std::time::Instant;

use anyhow::{ Context, Result };
use clap::Parser;
use log::info;

use ray4d::scene::Scene;
use ray4d::canvas::{ BitsPerPixel, Region };
use ray4d::stats::RenderStats;
use ray4d::consts::{ DEFAULT_BITS_PER_PIXEL, DEFAULT_OUT_FILE };

/// Renders a 4D scene into a cube of pixels.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Cli {
    /// JSON scene description
    scene: PathBuf,

    /// Image file to write
    #[clap(short, long, default_value = DEFAULT_OUT_FILE)]
    output: PathBuf,

    /// Bits per pixel, 12 or 24
    #[clap(short, long, default_value_t = DEFAULT_BITS_PER_PIXEL)]
    bits: u8,

    /// First pixel to render, as x,y,z
    #[clap(long)]
    start: Option<Pixel>,

    /// Last pixel to render (inclusive), as x,y,z
    #[clap(long)]
    end: Option<Pixel>,
}

/// A pixel coordinate given on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Pixel([usize; 3]);

impl FromStr for Pixel {
    type Err = String;

    fn from_str(s: &str) -> Result<Pixel, String> {
        let coords = s.split(',')
            .map(|c| c.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("bad pixel coordinate in `{}`: {}", s, e))?;

        match coords.as_slice() {
            &[x, y, z] => Ok(Pixel([x, y, z])),
            _ => Err(format!("expected three coordinates x,y,z, got `{}`", s)),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let cli = Cli::parse();
    let bits = BitsPerPixel::try_from(cli.bits)?;

    let scene = Scene::load(&cli.scene)
        .with_context(|| format!("loading scene {}", cli.scene.display()))?;

    let region = Region {
        start: cli.start.map_or(scene.region.start, |p| p.0),
        end: cli.end.map_or(scene.region.end, |p| p.0),
    };

    let res = scene.camera.resolution;
    info!("Rendering {} objects at {}x{}x{}, pixels {:?} to {:?}.",
        scene.world.objects.len(), res[0], res[1], res[2],
        region.start, region.end);

    let started = Instant::now();
    let mut stats = RenderStats::new();
    let canvas = scene.camera.render(&scene.world, &region, &mut stats)
        .context("rendering scene")?;
    info!("Finished in {:.2?}: {}.", started.elapsed(), stats);

    canvas.save(&cli.output, bits, scene.camera.aspect)
        .with_context(|| format!("writing image {}", cli.output.display()))?;
    info!("Wrote {}.", cli.output.display());

    Ok(())
}

#[test]
fn parse_pixel() {
    assert_eq!("3,4,5".parse::<Pixel>(), Ok(Pixel([3, 4, 5])));
    assert_eq!(" 0, 10 ,2".parse::<Pixel>(), Ok(Pixel([0, 10, 2])));

    assert!("3,4".parse::<Pixel>().is_err());
    assert!("3,4,5,6".parse::<Pixel>().is_err());
    assert!("3,-4,5".parse::<Pixel>().is_err());
}

#[test]
fn parse_command_line() {
    let cli = Cli::try_parse_from(&[
        "ray4d", "scene.json", "-b", "12", "--start", "1,2,3", "--end", "4,5,6",
    ]).unwrap();

    assert_eq!(cli.scene, PathBuf::from("scene.json"));
    assert_eq!(cli.output, PathBuf::from(DEFAULT_OUT_FILE));
    assert_eq!(cli.bits, 12);
    assert_eq!(cli.start, Some(Pixel([1, 2, 3])));
    assert_eq!(cli.end, Some(Pixel([4, 5, 6])));
}
