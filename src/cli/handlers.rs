use std::fs;
use std::io::Read;
use std::path::PathBuf;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::{load_config, read_file, resolve_file, write_file, write_with_backup};
use crate::model::{Status, Task, TaskList};
use crate::ops::autocomplete::auto_complete_parents;
use crate::ops::batch::{execute_batch, BatchRequest};
use crate::ops::front_matter_ops::{add_front_matter_content, parse_metadata_flags};
use crate::ops::next::find_next_incomplete;
use crate::ops::phase_ops::{add_phase, add_task_to_phase, has_phases};
use crate::ops::renumber::renumber;
use crate::ops::task_ops::{add_task, remove_task, update_task, update_status, TaskUpdate};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    match cli.command {
        Commands::Create(args) => cmd_create(args, json),
        Commands::Add(args) => cmd_add(args, json),
        Commands::Update(args) => cmd_update(args, json),
        Commands::Complete(args) => cmd_complete(args, json),
        Commands::Uncomplete(args) => cmd_uncomplete(args, json),
        Commands::Remove(args) => cmd_remove(args, json),
        Commands::List(args) => cmd_list(args, json),
        Commands::Next(args) => cmd_next(args, json),
        Commands::Progress(args) => cmd_progress(args, json),
        Commands::Renumber(args) => cmd_renumber(args, json),
        Commands::HasPhases(args) => cmd_has_phases(args, json),
        Commands::AddPhase(args) => cmd_add_phase(args, json),
        Commands::AddFrontmatter(args) => cmd_add_frontmatter(args, json),
        Commands::Batch(args) => cmd_batch(args),
    }
}

fn task_file(explicit: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(resolve_file(explicit, &load_config())?)
}

/// Adopt a requirements file named on the command line, refusing to diverge
/// from one the document already links against.
fn set_requirements_file(list: &mut TaskList, req_file: Option<String>) -> CmdResult {
    let Some(req_file) = req_file else {
        return Ok(());
    };
    match &list.requirements_file {
        Some(existing) if *existing != req_file => Err(format!(
            "inconsistent requirements file: document uses '{existing}', got '{req_file}'"
        )
        .into()),
        _ => {
            list.requirements_file = Some(req_file);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_create(args: CreateArgs, json: bool) -> CmdResult {
    if args.file.exists() {
        return Err(format!("file already exists: {}", args.file.display()).into());
    }
    let mut list = TaskList::new(args.title);
    if !args.references.is_empty() || !args.metadata.is_empty() {
        let metadata = parse_metadata_flags(&args.metadata)?;
        add_front_matter_content(&mut list, args.references, metadata)?;
    }
    write_file(&args.file, &list, &[])?;
    if json {
        print_json(&MutationJson::ok(None));
    } else {
        println!("created {}", args.file.display());
    }
    Ok(())
}

fn cmd_add(args: AddArgs, json: bool) -> CmdResult {
    let path = task_file(args.file)?;
    let (mut list, mut markers) = read_file(&path)?;

    set_requirements_file(&mut list, args.requirements_file)?;

    let mut task = Task::new("", args.title, Status::Pending);
    task.details = args.details;
    task.references = args.references;
    task.requirements = args.requirements;

    let id = match args.phase {
        Some(phase) => add_task_to_phase(&mut list, &mut markers, &phase, task)?,
        None => add_task(
            &mut list,
            &mut markers,
            args.parent.as_deref(),
            args.position.as_deref(),
            task,
        )?,
    };

    write_file(&path, &list, &markers)?;
    if json {
        print_json(&MutationJson::ok(Some(id)));
    } else {
        println!("added task {id}");
    }
    Ok(())
}

fn cmd_update(args: UpdateArgs, json: bool) -> CmdResult {
    let path = task_file(args.file)?;
    let (mut list, markers) = read_file(&path)?;
    set_requirements_file(&mut list, args.requirements_file)?;

    let completing = args.status == Some(Status::Completed);
    update_task(
        &mut list,
        &args.id,
        TaskUpdate {
            title: args.title,
            status: args.status,
            details: args.details,
            references: args.references,
            requirements: args.requirements,
        },
    )?;
    let auto_completed = if completing {
        auto_complete_parents(&mut list, &args.id)
    } else {
        Vec::new()
    };

    write_file(&path, &list, &markers)?;
    report_mutation(json, &args.id, auto_completed);
    Ok(())
}

fn cmd_complete(args: CompleteArgs, json: bool) -> CmdResult {
    let path = task_file(args.file)?;
    let (mut list, markers) = read_file(&path)?;
    update_status(&mut list, &args.id, Status::Completed)?;
    let auto_completed = auto_complete_parents(&mut list, &args.id);
    write_file(&path, &list, &markers)?;
    report_mutation(json, &args.id, auto_completed);
    Ok(())
}

fn cmd_uncomplete(args: UncompleteArgs, json: bool) -> CmdResult {
    let path = task_file(args.file)?;
    let (mut list, markers) = read_file(&path)?;
    update_status(&mut list, &args.id, Status::Pending)?;
    write_file(&path, &list, &markers)?;
    report_mutation(json, &args.id, Vec::new());
    Ok(())
}

fn cmd_remove(args: RemoveArgs, json: bool) -> CmdResult {
    let path = task_file(args.file)?;
    let (mut list, mut markers) = read_file(&path)?;
    remove_task(&mut list, &mut markers, &args.id)?;
    write_file(&path, &list, &markers)?;
    if json {
        print_json(&MutationJson::ok(None));
    } else {
        println!("removed task {}", args.id);
    }
    Ok(())
}

fn cmd_renumber(args: RenumberArgs, json: bool) -> CmdResult {
    let path = task_file(args.file)?;
    let (mut list, mut markers) = read_file(&path)?;
    renumber(&mut list, &mut markers);
    let backup = write_with_backup(&path, &list, &markers)?;
    if json {
        print_json(&MutationJson::ok(None));
    } else {
        println!("renumbered; backup at {}", backup.display());
    }
    Ok(())
}

fn cmd_add_phase(args: AddPhaseArgs, json: bool) -> CmdResult {
    let path = task_file(args.file)?;
    let (list, mut markers) = read_file(&path)?;
    add_phase(&list, &mut markers, &args.name)?;
    write_file(&path, &list, &markers)?;
    if json {
        print_json(&MutationJson::ok(None));
    } else {
        println!("added phase {}", args.name);
    }
    Ok(())
}

fn cmd_add_frontmatter(args: AddFrontmatterArgs, json: bool) -> CmdResult {
    let path = task_file(args.file)?;
    let (mut list, markers) = read_file(&path)?;
    let metadata = parse_metadata_flags(&args.metadata)?;
    add_front_matter_content(&mut list, args.references, metadata)?;
    write_file(&path, &list, &markers)?;
    if json {
        print_json(&MutationJson::ok(None));
    } else {
        println!("updated front matter");
    }
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> CmdResult {
    let text = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let request: BatchRequest = serde_json::from_str(&text)?;

    let explicit = args.file.or_else(|| request.file.as_deref().map(Into::into));
    let path = task_file(explicit)?;
    let (mut list, mut markers) = read_file(&path)?;

    set_requirements_file(&mut list, request.requirements_file.clone())?;

    let dry_run = args.dry_run || request.dry_run;
    let response = execute_batch(&mut list, &mut markers, &request.operations, dry_run);
    if response.success && !dry_run {
        write_file(&path, &list, &markers)?;
    }
    print_json(&response);
    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, json: bool) -> CmdResult {
    let path = task_file(args.file)?;
    let (list, markers) = read_file(&path)?;
    if json {
        print_json(&ListJson {
            title: list.title.clone(),
            modified: list.modified,
            tasks: list.tasks.iter().map(TaskJson::from_task).collect(),
            phases: markers.iter().map(|m| m.name.clone()).collect(),
        });
    } else {
        print_list(&list, &markers);
    }
    Ok(())
}

fn cmd_next(args: NextArgs, json: bool) -> CmdResult {
    let path = task_file(args.file)?;
    let (list, _) = read_file(&path)?;
    match find_next_incomplete(&list.tasks) {
        Some(next) => {
            if json {
                print_json(&NextJson {
                    id: next.task.id.clone(),
                    title: next.task.title.clone(),
                    status: next.task.status,
                    incomplete_children: next
                        .incomplete_children
                        .iter()
                        .map(|t| TaskJson::from_task(t))
                        .collect(),
                });
            } else {
                print_next(&next);
            }
        }
        None => {
            if json {
                print_json(&serde_json::json!({ "done": true }));
            } else {
                println!("all tasks complete");
            }
        }
    }
    Ok(())
}

fn cmd_progress(args: ProgressArgs, json: bool) -> CmdResult {
    let path = task_file(args.file)?;
    let (list, _) = read_file(&path)?;
    let stats = list.stats();
    if json {
        print_json(&ProgressJson {
            total: stats.total,
            pending: stats.pending,
            in_progress: stats.in_progress,
            completed: stats.completed,
            percent_complete: stats.percent_complete(),
        });
    } else {
        print_progress(&stats);
    }
    Ok(())
}

fn cmd_has_phases(args: HasPhasesArgs, json: bool) -> CmdResult {
    let path = task_file(args.file)?;
    let (_, markers) = read_file(&path)?;
    let result = has_phases(&markers);
    if json {
        print_json(&serde_json::json!({ "hasPhases": result }));
    } else {
        println!("{result}");
    }
    Ok(())
}

fn report_mutation(json: bool, id: &str, auto_completed: Vec<String>) {
    if json {
        print_json(&MutationJson {
            success: true,
            id: Some(id.to_string()),
            auto_completed,
        });
    } else {
        println!("updated task {id}");
        for pid in auto_completed {
            println!("auto-completed parent {pid}");
        }
    }
}
