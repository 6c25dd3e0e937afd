use console::Style;
use skyoff_core::pipeline::config::SkyoffConfig;
use skyoff_core::pipeline::{ApplyRun, FitRun, MeasurementRun};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    warn: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            warn: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(title.chars().count())));
    println!();
}

pub fn print_measure_summary(config: &SkyoffConfig, run: &MeasurementRun) {
    let s = Styles::new();
    print_title(&s, "Pair Measurements");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Images"),
        s.value.apply_to(run.file.filenames.len())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Flux scale"),
        s.value.apply_to(&config.flux)
    );
    if let Some(catalog) = &run.catalog {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Catalog"),
            s.value.apply_to(format!("{} matched", catalog.applied))
        );
        if !catalog.unmatched.is_empty() {
            println!(
                "  {:<14}{}",
                s.label.apply_to("Unmatched"),
                s.warn.apply_to(catalog.unmatched.join(", "))
            );
        }
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Candidates"),
        s.value.apply_to(run.overlap.candidate_pairs().count())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Measured"),
        s.value.apply_to(run.file.measurements.len())
    );
    if !run.insufficient.is_empty() {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Too small"),
            s.warn.apply_to(format!(
                "{} (< {} px)",
                run.insufficient.len(),
                config.measure.min_pixels
            ))
        );
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.measurements.display())
    );
    println!();
}

pub fn print_fit_summary(config: &SkyoffConfig, run: &FitRun) {
    let s = Styles::new();
    print_title(&s, "Offset Fit");

    let solution = &run.solution;
    println!(
        "  {:<14}{}",
        s.label.apply_to("Observations"),
        s.value.apply_to(solution.residuals.len())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Weighting"),
        s.value.apply_to(&config.fit.weighting)
    );
    match &run.bootstrap {
        Some(boot) if !boot.unreached.is_empty() => println!(
            "  {:<14}{}",
            s.label.apply_to("Bootstrap"),
            s.warn.apply_to(format!("{} image(s) unreachable", boot.unreached.len()))
        ),
        Some(boot) => println!(
            "  {:<14}{}",
            s.label.apply_to("Bootstrap"),
            s.value.apply_to(format!("{} level(s)", boot.levels))
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Bootstrap"),
            s.warn.apply_to("disabled")
        ),
    }
    if !run.excluded.is_empty() {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Excluded"),
            s.warn.apply_to(format!(
                "{:?}",
                run.excluded.iter().map(|k| k + 1).collect::<Vec<_>>()
            ))
        );
    }
    match solution.reduced_chi_square {
        Some(chi2) => println!(
            "  {:<14}{}",
            s.label.apply_to("Chi2 / dof"),
            s.value.apply_to(format!("{:.4}", chi2))
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Chi2 / dof"),
            s.warn.apply_to("no degrees of freedom")
        ),
    }
    println!();

    println!("  {}", s.header.apply_to("Offsets"));
    for (k, name) in run.filenames.iter().enumerate() {
        println!(
            "    {:>5}  {:<40} {:>12.4} {}",
            s.label.apply_to(k + 1),
            name,
            solution.weighted.offsets[k],
            s.label.apply_to(format!(
                "(pass 1: {:.4} +/- {:.4})",
                solution.unweighted.offsets[k], solution.unweighted.uncertainties[k]
            ))
        );
    }
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.offsets.display())
    );
    println!();
}

pub fn print_apply_summary(config: &SkyoffConfig, run: &ApplyRun) {
    let s = Styles::new();
    print_title(&s, "Applied Offsets");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Offsets"),
        s.path.apply_to(config.offsets.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Flux scale"),
        s.value.apply_to(&config.flux)
    );
    println!();
    for (path, shift) in &run.outputs {
        println!(
            "    {:>12.4}  {}",
            shift,
            s.path.apply_to(path.display())
        );
    }
    println!();
}
