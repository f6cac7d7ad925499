use std::{fs::File, io::BufWriter, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use mo_core::{
    basis::BasisSet,
    ctab::Ctab,
    export::{collect_atoms, collect_basis_set, DrawArgs, Snapshot},
    hf::{restricted_hartree_fock, HartreeFockInput},
};

/// Calculate molecular orbitals and hand them to the visualizer.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// path to ctab (.mol) file
    path: PathBuf,

    /// basis set to use, either a bundled name or a basis set exchange json file
    #[arg(long, short, default_value = "sto-3g")]
    basis: String,

    /// The charge of the molecule
    #[arg(long, short, default_value_t = 0, allow_negative_numbers = true)]
    charge: i32,

    /// The maximum number of iterations the SCF loop should attempt before the
    /// system is considered to not converge
    #[arg(long, default_value_t = 100)]
    max_iterations: usize,

    /// if the rms of the density matrix drops below this, the system is considered
    /// converged
    #[arg(long, default_value_t = 1e-6)]
    epsilon: f64,

    /// the visualizer to start
    #[arg(long, env = "MO_DRAW", default_value = "mo-draw")]
    drawer: String,

    /// print the visualizer command line instead of running it
    #[arg(long)]
    dry_run: bool,

    /// write atoms, basis and orbitals as json
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,

    #[arg(long, short)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let ctab = Ctab::load(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    log::info!("{}: {} atoms", ctab.title, ctab.atoms.len());
    let molecule = ctab.molecule()?;

    let basis_set = BasisSet::resolve(&args.basis)
        .with_context(|| format!("failed to load basis set '{}'", args.basis))?;

    let start = Instant::now();
    let output = restricted_hartree_fock(&HartreeFockInput {
        molecule: &molecule,
        basis_set: &basis_set,
        charge: args.charge,
        max_iterations: args.max_iterations,
        epsilon: args.epsilon,
    })
    .context("hartree fock failed")?;

    log::info!(
        "hartree fock converged after {} iterations and {:0.2?}",
        output.iterations,
        start.elapsed()
    );
    log::info!("electronic energy: {:3.6}", output.electronic_energy);
    log::info!("nuclear repulsion energy: {:3.6}", output.nuclear_repulsion);
    log::info!("hartree fock energy: {:3.6}", output.total_energy());
    log::debug!("orbital energies: {:3.4?}", output.orbital_energies.as_slice());

    let atoms = collect_atoms(&molecule);
    let basis = collect_basis_set(&molecule, &basis_set)?;

    if let Some(path) = &args.dump {
        let snapshot = Snapshot::new(&ctab.title, &molecule, &basis_set, &basis, &output);
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &snapshot)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("wrote {}", path.display());
    }

    let draw = DrawArgs::new(&atoms, &basis, &output.orbital_coefficients);
    if args.dry_run {
        println!("{}", draw.shell_line(&args.drawer));
        return Ok(());
    }

    draw.run(&args.drawer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Args;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["mo-calc", "water.mol"]).unwrap();

        assert_eq!(args.basis, "sto-3g");
        assert_eq!(args.charge, 0);
        assert_eq!(args.max_iterations, 100);
        assert_eq!(args.epsilon, 1e-6);
        assert!(!args.dry_run);
        assert!(args.dump.is_none());
    }

    #[test]
    fn options() {
        let args = Args::try_parse_from([
            "mo-calc",
            "-b",
            "6-31g",
            "--charge",
            "-1",
            "--dry-run",
            "--drawer",
            "/opt/mo-draw",
            "--dump",
            "out.json",
            "water.mol",
        ])
        .unwrap();

        assert_eq!(args.basis, "6-31g");
        assert_eq!(args.charge, -1);
        assert_eq!(args.drawer, "/opt/mo-draw");
        assert!(args.dry_run);
        assert_eq!(args.dump.unwrap().to_str(), Some("out.json"));
        assert_eq!(args.path.to_str(), Some("water.mol"));
    }

    #[test]
    fn path_is_required() {
        assert!(Args::try_parse_from(["mo-calc"]).is_err());
    }
}
