#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use planif::{
    generation::{GenerationOptions, Generator, Severity},
    io,
    model::{AreaId, Dataset, GenerationId, PersonId, ScheduleId, ScheduleStatus},
    schedule::{self, ScheduleUpdate},
    store::{JsonStorage, MemoryStore, Storage},
    GenerationRequest,
};
use clap::{Parser, Subcommand};
use std::fs;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de génération de plannings (jeu de données JSON local)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du jeu de données
    #[arg(long, global = true, default_value = "planning.json")]
    data: String,

    /// Seuil de l'avertissement de fatigue (créneaux consécutifs)
    #[arg(long, global = true, default_value_t = 3)]
    max_consecutive_slots: u32,

    /// Graine de l'ordre `random`
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Importer des personnes depuis un CSV
    ImportPeople {
        #[arg(long)]
        csv: String,
    },

    /// Importer des absences depuis un CSV
    ImportAbsences {
        #[arg(long)]
        csv: String,
    },

    /// Prévisualiser une génération (aucune écriture)
    Preview {
        #[arg(long)]
        area: String,
        /// Configuration de génération (JSON)
        #[arg(long)]
        config: String,
        #[arg(long)]
        out_json: Option<String>,
    },

    /// Générer et enregistrer les créneaux
    Create {
        #[arg(long)]
        area: String,
        #[arg(long)]
        config: String,
        /// Identifiant de la personne à l'origine de la génération
        #[arg(long)]
        actor: String,
    },

    /// Lister les générations d'une zone
    Generations {
        #[arg(long)]
        area: String,
    },

    /// Détail d'une génération
    Show {
        #[arg(long)]
        area: String,
        #[arg(long)]
        id: String,
    },

    /// Supprimer une génération et ses créneaux
    Remove {
        #[arg(long)]
        area: String,
        #[arg(long)]
        id: String,
    },

    /// Modifier un créneau (statut/commentaire seulement s'il est généré)
    UpdateShift {
        #[arg(long)]
        area: String,
        #[arg(long)]
        id: String,
        #[arg(long, value_parser = parse_status)]
        status: Option<ScheduleStatus>,
        #[arg(long)]
        comments: Option<String>,
        /// RFC3339 UTC
        #[arg(long)]
        start: Option<String>,
        /// RFC3339 UTC
        #[arg(long)]
        end: Option<String>,
    },

    /// Exporter les créneaux d'une zone en CSV
    Export {
        #[arg(long)]
        area: String,
        #[arg(long)]
        out: String,
    },
}

fn parse_status(raw: &str) -> Result<ScheduleStatus, String> {
    match raw.to_ascii_lowercase().as_str() {
        "pending" => Ok(ScheduleStatus::Pending),
        "confirmed" => Ok(ScheduleStatus::Confirmed),
        "completed" => Ok(ScheduleStatus::Completed),
        "cancelled" => Ok(ScheduleStatus::Cancelled),
        other => Err(format!("unknown status: {other}")),
    }
}

fn read_request(path: &str) -> Result<GenerationRequest> {
    let data = fs::read(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing generation config {path}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.data)?;
    let data = if storage.path().exists() {
        storage.load()?
    } else {
        Dataset::default()
    };
    let mut opts = GenerationOptions {
        max_consecutive_slots: cli.max_consecutive_slots,
        ..GenerationOptions::default()
    };
    if let Some(seed) = cli.seed {
        opts.seed = seed;
    }
    let mut generator = Generator::with_options(MemoryStore::new(data), opts);

    let code = match cli.cmd {
        Commands::ImportPeople { csv } => {
            let people = io::import_people_csv(csv)?;
            println!("Imported {} person(s)", people.len());
            generator.store_mut().data_mut().people.extend(people);
            storage.save(generator.store().data())?;
            0
        }
        Commands::ImportAbsences { csv } => {
            let absences = io::import_absences_csv(csv)?;
            println!("Imported {} absence(s)", absences.len());
            generator.store_mut().data_mut().absences.extend(absences);
            storage.save(generator.store().data())?;
            0
        }
        Commands::Preview {
            area,
            config,
            out_json,
        } => {
            let request = read_request(&config)?;
            let preview = generator.preview(&AreaId::new(area), &request)?;
            if let Some(path) = out_json {
                io::export_preview_json(path, &preview)?;
            }
            for slot in &preview.schedules {
                let names = slot
                    .participants
                    .people()
                    .into_iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "#{} | {} → {} | {}",
                    slot.index,
                    slot.start.to_rfc3339(),
                    slot.end.to_rfc3339(),
                    if slot.participants.is_empty() { "-" } else { names.as_str() }
                );
                for f in &slot.findings {
                    let tag = match f.severity {
                        Severity::Warning => "warning",
                        Severity::Error => "error",
                    };
                    println!("    {tag}: {}", f.message);
                }
            }
            let s = &preview.summary;
            println!(
                "schedules={} participants={} warnings={} errors={} balance={:?}",
                s.total_schedules,
                s.total_participants,
                s.warnings,
                s.errors,
                s.distribution_balance
            );
            // Code 2 = le plan contient des erreurs bloquantes
            if s.errors > 0 {
                2
            } else {
                0
            }
        }
        Commands::Create {
            area,
            config,
            actor,
        } => {
            let request = read_request(&config)?;
            let result =
                generator.create(&AreaId::new(area), &request, &PersonId::new(actor))?;
            storage.save(generator.store().data())?;
            println!(
                "Generation {} created with {} schedule(s)",
                result.generation.id,
                result.schedules.len()
            );
            0
        }
        Commands::Generations { area } => {
            for g in generator.find_all(&AreaId::new(area))? {
                println!(
                    "{} | {} | {:?} | {} schedule(s) | by {}",
                    g.id,
                    g.created_at.to_rfc3339(),
                    g.configuration.generation_type,
                    g.total_schedules,
                    g.created_by
                );
            }
            0
        }
        Commands::Show { area, id } => {
            let details = generator.find_one(&AreaId::new(area), &GenerationId::new(id))?;
            println!("{}", serde_json::to_string_pretty(&details)?);
            0
        }
        Commands::Remove { area, id } => {
            let removed = generator.remove(&AreaId::new(area), &GenerationId::new(id))?;
            storage.save(generator.store().data())?;
            println!("Removed generation and {removed} schedule(s)");
            0
        }
        Commands::UpdateShift {
            area,
            id,
            status,
            comments,
            start,
            end,
        } => {
            let change = ScheduleUpdate {
                start: start.map(|s| s.parse::<DateTime<Utc>>()).transpose()?,
                end: end.map(|s| s.parse::<DateTime<Utc>>()).transpose()?,
                status,
                comments,
                ..ScheduleUpdate::default()
            };
            let updated = schedule::update(
                generator.store_mut(),
                &AreaId::new(area),
                &ScheduleId::new(id),
                change,
            )?;
            storage.save(generator.store().data())?;
            println!("Schedule {} updated", updated.id);
            0
        }
        Commands::Export { area, out } => {
            let n = io::export_schedules_csv(out, generator.store().data(), &AreaId::new(area))?;
            println!("Exported {n} schedule(s)");
            0
        }
    };

    std::process::exit(code);
}
