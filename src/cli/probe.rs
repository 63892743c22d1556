use anyhow::{Result, bail};
use indicatif::MultiProgress;

use mediacodec::ndk;
use mediacodec::resolve::{EntryPoint, EntryStatus};

use super::command::{Cli, ProbeArgs};

pub fn cmd_probe(args: &ProbeArgs, _cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    if args.list {
        show_report(multi, &declared(ndk::entry_points()), false);
        return Ok(());
    }

    log::info!("Probing codec library: {}", args.library.display());

    let statuses = ndk::probe(&args.library)?;
    show_report(multi, &statuses, true);

    let missing = missing_required(&statuses);
    if !missing.is_empty() {
        bail!(
            "{} is not usable, missing required entry points: {}",
            args.library.display(),
            missing.join(", ")
        );
    }

    match ndk::NdkApi::load(&args.library) {
        Ok(api) => log::info!(
            "Library is usable (output surface switching: {})",
            if api.supports_output_surface_switch() {
                "supported"
            } else {
                "unsupported"
            }
        ),
        Err(e) => bail!("Library resolved in probe but failed to load: {e}"),
    }

    Ok(())
}

/// Declared entry points, reported as if every one resolved.
fn declared(entries: &[EntryPoint]) -> Vec<EntryStatus> {
    entries
        .iter()
        .map(|&entry| EntryStatus {
            entry,
            resolved: true,
        })
        .collect()
}

fn show_report(multi: Option<&MultiProgress>, statuses: &[EntryStatus], loaded: bool) {
    let report = || print_report(statuses, loaded);
    match multi {
        Some(multi) => multi.suspend(report),
        None => report(),
    }
}

fn print_report(statuses: &[EntryStatus], loaded: bool) {
    println!();
    println!("Codec Entry Points");
    println!("==================");
    for status in statuses {
        println!(
            "  {:36}  {:8}  {}",
            status.entry.name,
            match (loaded, status.resolved) {
                (false, _) => "declared",
                (true, true) => "resolved",
                (true, false) => "missing",
            },
            if status.entry.required {
                "required"
            } else {
                "optional"
            }
        );
    }
    println!();
}

fn missing_required(statuses: &[EntryStatus]) -> Vec<&'static str> {
    statuses
        .iter()
        .filter(|status| status.entry.required && !status.resolved)
        .map(|status| status.entry.name)
        .collect()
}

#[test]
fn only_required_gaps_fail_the_probe() {
    let statuses = [
        EntryStatus {
            entry: EntryPoint {
                name: "AMediaCodec_start",
                required: true,
            },
            resolved: false,
        },
        EntryStatus {
            entry: EntryPoint {
                name: "AMediaCodec_setOutputSurface",
                required: false,
            },
            resolved: false,
        },
        EntryStatus {
            entry: EntryPoint {
                name: "AMediaCodec_stop",
                required: true,
            },
            resolved: true,
        },
    ];
    assert_eq!(missing_required(&statuses), ["AMediaCodec_start"]);
}

#[test]
fn declared_list_covers_the_ndk_table() {
    let statuses = declared(ndk::entry_points());
    assert_eq!(statuses.len(), 19);
    assert!(missing_required(&statuses).is_empty());
    assert_eq!(
        statuses
            .iter()
            .filter(|status| !status.entry.required)
            .map(|status| status.entry.name)
            .collect::<Vec<_>>(),
        ["AMediaCodec_setOutputSurface"]
    );
}
