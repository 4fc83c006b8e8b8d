use std::io::{self, BufRead, Write};

use anyhow::{Context, anyhow, bail};
use tracing::{debug, info, instrument, warn};

use crate::cli::{AddArgs, Command, EditArgs, ListArgs};
use crate::config::Config;
use crate::dashboard::{Dashboard, Outcome};
use crate::facade::TaskFacade;
use crate::form::{TaskForm, validate_email, validate_update};
use crate::render::Renderer;
use crate::repository::{HttpTaskRepository, TaskRepository};
use crate::session::{Session, SessionStore};
use crate::task::Task;
use crate::users::{self, HttpUserRepository};

const DELETE_PROMPT: &str = "¿Estás seguro de que quieres eliminar esta tarea?";

#[instrument(skip(cfg, store, renderer))]
pub async fn dispatch(
    command: Command,
    cfg: &Config,
    store: &SessionStore,
    renderer: &Renderer,
) -> anyhow::Result<()> {
    match command {
        Command::Login { email } => login(cfg, store, &email).await,
        Command::Logout => {
            store.clear()?;
            println!("Sesión cerrada");
            Ok(())
        }
        Command::Config => {
            let mut out = io::stdout().lock();
            for (key, value) in cfg.entries() {
                writeln!(out, "{key} = {value}")?;
            }
            Ok(())
        }
        command => {
            let session = store.load()?;
            if !session.is_authenticated() {
                warn!("no stored session; run `taskdeck login <email>` first");
            }
            let repository = HttpTaskRepository::new(cfg.api_url(), session)?;
            let mut dashboard = Dashboard::new(TaskFacade::new(repository));
            run_task_command(&mut dashboard, command, renderer, &mut io::stdin().lock()).await
        }
    }
}

#[instrument(skip(cfg, store))]
async fn login(cfg: &Config, store: &SessionStore, email: &str) -> anyhow::Result<()> {
    let email = validate_email(email)?;
    let repository = HttpUserRepository::new(cfg.api_url())?;
    let session = Session::anonymous();

    users::login(&repository, &session, &email)
        .await
        .with_context(|| format!("login failed for {email}"))?;
    store.save(&session)?;

    info!("session stored");
    println!("Sesión iniciada como {email}");
    Ok(())
}

/// Runs one task command against a freshly loaded dashboard. Answers to
/// confirmation prompts are read from `input`.
pub async fn run_task_command<R, I>(
    dashboard: &mut Dashboard<R>,
    command: Command,
    renderer: &Renderer,
    input: &mut I,
) -> anyhow::Result<()>
where
    R: TaskRepository,
    I: BufRead,
{
    let outcome = dashboard.load().await;
    ensure_applied(dashboard, outcome)?;

    let mut out = io::stdout();
    match command {
        Command::List(ListArgs { pending, completed }) => {
            let snapshot = dashboard.snapshot();
            if pending {
                renderer.write_task_table(&mut out, snapshot.pending_tasks())?;
            } else if completed {
                renderer.write_task_table(&mut out, snapshot.completed_tasks())?;
            } else {
                renderer.write_task_table(&mut out, snapshot.tasks())?;
            }
        }
        Command::Add(AddArgs {
            title,
            description,
            priority,
        }) => {
            let request = TaskForm {
                title,
                description,
                priority,
            }
            .into_create_request()?;

            dashboard.open_create_dialog();
            let outcome = dashboard.create(&request).await;
            ensure_applied(dashboard, outcome)?;

            let snapshot = dashboard.snapshot();
            if let Some(task) = snapshot.tasks().first() {
                writeln!(out, "Tarea creada")?;
                renderer.write_task(&mut out, task)?;
            }
        }
        Command::Edit(EditArgs {
            id,
            title,
            description,
            priority,
        }) => {
            if title.is_none() && description.is_none() && priority.is_none() {
                bail!("Nada que actualizar: indica --title, --description o --priority");
            }
            let request =
                validate_update(&id, title.as_deref(), description.as_deref(), priority)?;

            if !dashboard.open_edit_dialog(&id) {
                bail!("La tarea no existe");
            }
            let outcome = dashboard.update(&request).await;
            ensure_applied(dashboard, outcome)?;

            if let Some(task) = dashboard.snapshot().find(&id) {
                writeln!(out, "Tarea actualizada")?;
                renderer.write_task(&mut out, task)?;
            }
        }
        Command::Toggle { id } => {
            let outcome = dashboard.toggle_status(&id).await;
            ensure_applied(dashboard, outcome)?;

            if let Some(task) = dashboard.snapshot().find(&id) {
                let state = if task.is_done { "completada" } else { "pendiente" };
                writeln!(out, "Tarea {} marcada como {state}", task.id)?;
            }
        }
        Command::Delete { id, yes } => {
            let outcome = dashboard
                .delete(&id, |task| yes || confirm_delete(task, &mut out, input))
                .await;
            match outcome {
                Outcome::Declined => writeln!(out, "Eliminación cancelada")?,
                outcome => {
                    ensure_applied(dashboard, outcome)?;
                    writeln!(out, "Tarea {id} eliminada")?;
                }
            }
        }
        Command::Stats => {
            renderer.write_stats(&mut out, &dashboard.snapshot())?;
        }
        Command::Login { .. } | Command::Logout | Command::Config => {
            return Err(anyhow!("not a task command"));
        }
    }

    Ok(())
}

fn ensure_applied<R: TaskRepository>(
    dashboard: &Dashboard<R>,
    outcome: Outcome,
) -> anyhow::Result<()> {
    match outcome {
        Outcome::Applied | Outcome::Declined => Ok(()),
        Outcome::Failed => {
            let snapshot = dashboard.snapshot();
            Err(anyhow!(
                "{}",
                snapshot.error().unwrap_or("La operación falló")
            ))
        }
    }
}

fn confirm_delete<W, I>(task: Option<&Task>, out: &mut W, input: &mut I) -> bool
where
    W: Write,
    I: BufRead,
{
    if let Some(task) = task {
        let _ = writeln!(out, "{} {}", task.id, task.title);
    }
    let _ = write!(out, "{DELETE_PROMPT} [s/N] ");
    let _ = out.flush();

    let mut answer = String::new();
    if let Err(err) = input.read_line(&mut answer) {
        debug!(error = %err, "could not read confirmation; treating as no");
        return false;
    }

    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}
