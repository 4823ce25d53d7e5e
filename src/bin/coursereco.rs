/**
 * CourseReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::env;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use getopts::{Matches, Options};
use tracing::{info, warn, Level};

use coursereco::io;
use coursereco::matrix;
use coursereco::recommend;
use coursereco::{BasicNormalizer, Catalog, EngineConfig, EngineError, SparseUserIndex};

const RECOMMENDATIONS_FILE: &str = "recommendations.csv";
const SIMILARITIES_FILE: &str = "similarities.csv";
const USER_COURSES_FILE: &str = "user_courses.json";

fn main() {

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("l", "leads", "Leads file (required). CSV with the headers user_id, course_id, \
        course_title, course_description, course_category, center and created_on.", "PATH");
    opts.optopt("r", "reviews", "Reviews file (required). Same headers as the leads file plus \
        rating.", "PATH");
    opts.optopt("o", "output-dir", "Directory for the computed artifacts (optional, defaults to \
        the current directory).", "DIR");
    opts.optopt("c", "config", "JSON configuration file (optional).", "PATH");
    opts.optopt("n", "num-recs", "Maximum number of recommendations per course (optional, \
        defaults to 10).", "NUMBER");
    opts.optopt("s", "min-similarity", "Minimum content similarity of two courses (optional, \
        defaults to 0.5).", "NUMBER");
    opts.optopt("", "sample-limit", "Only compute content similarities between the first NUMBER \
        courses (optional).", "NUMBER");
    opts.optflag("", "with-similarities", "Compute and persist content similarities.");
    opts.optopt("", "resume", "Read the prepared catalog from DIR if a previous run left it \
        there.", "DIR");
    opts.optflag("v", "verbose", "Log debug output");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let can_resume = matches.opt_str("resume")
        .map(|dir| io::has_catalog(dir))
        .unwrap_or(false);

    if !can_resume && (!matches.opt_present("l") || !matches.opt_present("r")) {
        return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify the input via --leads and --reviews."),
        );
    }

    let level = if matches.opt_present("v") { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match engine_config(&matches) {
        Ok(config) => config,
        Err(failure) => {
            let hint = format!("{:#}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let output_dir = PathBuf::from(matches.opt_str("o").unwrap_or_else(|| String::from(".")));

    if let Err(failure) = run(&matches, &config, &output_dir) {
        eprintln!("Error: {:#}", failure);
        std::process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}

/// Defaults, overridden by the config file, overridden by command line options.
fn engine_config(matches: &Matches) -> anyhow::Result<EngineConfig> {

    let mut config = match matches.opt_str("c") {
        Some(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("Cannot read config file {}", path))?,
        None => EngineConfig::default(),
    };

    if let Some(max_recs) = matches.opt_get::<usize>("n")
        .context("Problem with option 'n'")? {
        config.max_recs = max_recs;
    }

    if let Some(min_similarity) = matches.opt_get::<f64>("s")
        .context("Problem with option 's'")? {
        config.min_similarity = min_similarity;
    }

    if let Some(sample_limit) = matches.opt_get::<usize>("sample-limit")
        .context("Problem with option 'sample-limit'")? {
        config.sample_limit = Some(sample_limit);
    }

    if matches.opt_present("with-similarities") {
        config.persist_similarities = true;
    }

    Ok(config)
}

fn run(matches: &Matches, config: &EngineConfig, output_dir: &Path) -> anyhow::Result<()> {

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Cannot create {}", output_dir.display()))?;

    let normalizer = BasicNormalizer::new();
    let mut save_failures = 0;

    let resume_dir = matches.opt_str("resume").filter(|dir| io::has_catalog(dir));

    let catalog = match resume_dir {
        Some(dir) => {
            info!(dir = dir.as_str(), "Reading prepared catalog");
            io::read_catalog(&dir)?
        },
        None => {
            let catalog = prepare_catalog(matches, config, &normalizer)?;

            // Keep going on failures, the remaining artifacts do not depend on the saved files
            if let Err(failure) = io::write_catalog(output_dir, &catalog) {
                warn!(%failure, "Saving the course catalog failed");
                save_failures += 1;
            }

            catalog
        }
    };

    let matrix = matrix::build(&catalog.leads);
    let index = SparseUserIndex::compress(&matrix);

    let user_courses_path = output_dir.join(USER_COURSES_FILE);
    let saved = File::create(&user_courses_path)
        .map_err(EngineError::from)
        .and_then(|file| io::write_user_courses(BufWriter::new(file), &index));

    if let Err(failure) = saved {
        warn!(%failure, "Saving the user requested courses map failed");
        save_failures += 1;
    }

    let recommendations = recommend::full_run(&index, config.max_recs, config.num_threads);

    if let Err(failure) = io::write_csv_file(output_dir.join(RECOMMENDATIONS_FILE), &recommendations) {
        warn!(%failure, "Saving course-course recommendations failed");
        save_failures += 1;
    }

    if config.persist_similarities {
        warn!("Computing content similarities, this can take a long time");
        let similarities = coursereco::course_similarities(&catalog, &normalizer, config)?;

        if let Err(failure) = io::write_csv_file(output_dir.join(SIMILARITIES_FILE), &similarities) {
            warn!(%failure, "Saving course content similarities failed");
            save_failures += 1;
        }
    } else {
        info!("Skipping content similarities, enable them with --with-similarities");
    }

    if save_failures > 0 {
        bail!("{} artifacts could not be saved to {}", save_failures, output_dir.display());
    }

    info!(dir = %output_dir.display(), "Pipeline completed");
    Ok(())
}

fn prepare_catalog(
    matches: &Matches,
    config: &EngineConfig,
    normalizer: &BasicNormalizer,
) -> anyhow::Result<Catalog> {

    let leads_path = matches.opt_str("l").context("No leads file given")?;
    let reviews_path = matches.opt_str("r").context("No reviews file given")?;

    info!(path = leads_path.as_str(), "Reading leads");
    let leads = io::read_leads(&leads_path)
        .with_context(|| format!("Cannot read leads from {}", leads_path))?;

    info!(path = reviews_path.as_str(), "Reading reviews");
    let reviews = io::read_reviews(&reviews_path)
        .with_context(|| format!("Cannot read reviews from {}", reviews_path))?;

    Ok(Catalog::prepare(leads, reviews, normalizer, config))
}
