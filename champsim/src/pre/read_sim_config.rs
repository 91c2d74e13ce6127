use crate::core::simulator::SimulationPars;
use anyhow::Context;
use std::fs::OpenOptions;
use std::path::Path;

/// read_sim_pars reads the JSON file and decodes the JSON string into the simulation parameters
/// struct. Parameters missing in the file keep their default values.
pub fn read_sim_pars(filepath: &Path) -> anyhow::Result<SimulationPars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open parameter file {}!",
            filepath.display()
        ))?;
    let pars: SimulationPars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse parameter file {}!",
        filepath.display()
    ))?;
    pars.validate().context(format!(
        "Invalid simulation parameters in {}!",
        filepath.display()
    ))?;
    Ok(pars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("champsim_{}_{}.json", name, std::process::id()));
        let mut fh = std::fs::File::create(&path).unwrap();
        fh.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let path = write_tmp(
            "partial",
            r#"{ "no_simulations": 10000, "seed": 7, "scoring": { "sprint_probability": 0.0 } }"#,
        );
        let pars = read_sim_pars(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(pars.no_simulations, 10_000);
        assert_eq!(pars.seed, Some(7));
        assert_eq!(pars.scoring.sprint_probability, 0.0);
        assert_eq!(pars.scoring.race_points.len(), 10);
        assert_eq!(pars.variance_band, [0.6, 1.4]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let path = write_tmp("invalid", r#"{ "variance_band": [1.0, 1.0] }"#);
        let res = read_sim_pars(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(res.is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_sim_pars(Path::new("does/not/exist.json")).unwrap_err();
        assert!(format!("{}", err).contains("does/not/exist.json"));
    }
}
