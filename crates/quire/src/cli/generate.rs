//! Outline and chapter command handlers.

use super::commands::{ChapterCommands, OutlineCommands, OutputFormat};
use super::render::{print_chapter, print_json, print_outline};
use quire::{
    ArtifactRepository, ChapterEdit, DEFAULT_CHAPTER_LENGTH, DEFAULT_STYLE, NarrativePipeline,
    OpenAiClient, OutlineParams, PipelineEvent, PipelineHandle, Project, QuireConfig, QuireResult,
    SqliteArtifactRepository, StyleParams, ValidationError, save_chapter_edit, save_outline_edit,
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a command needs: merged configuration and the open store.
pub struct Session {
    /// Merged configuration, not yet validated
    pub config: QuireConfig,
    /// The open artifact store
    pub repository: Arc<SqliteArtifactRepository>,
    /// Streaming override from the command line; `None` defers to the config
    pub streaming: Option<bool>,
}

impl Session {
    fn pipeline(&self) -> QuireResult<Arc<NarrativePipeline<OpenAiClient>>> {
        self.config.validate()?;
        let client = OpenAiClient::new(self.config.openai_config()?)?;
        let pipeline = NarrativePipeline::new(client, self.repository.clone())
            .with_config(self.config.pipeline_config(self.streaming)?);
        Ok(Arc::new(pipeline))
    }

    async fn project(&self, id: i64) -> QuireResult<Project> {
        Ok(self
            .repository
            .get_project(id)
            .await?
            .ok_or_else(|| ValidationError::new(format!("project {} does not exist", id)))?)
    }
}

/// Handle outline commands.
pub async fn handle_outline_command(cmd: OutlineCommands, session: &Session) -> QuireResult<()> {
    match cmd {
        OutlineCommands::Generate {
            project_id,
            theme,
            style,
            topic,
        } => {
            let project = session.project(project_id).await?;
            let params = OutlineParams::new(
                theme.or(project.theme).unwrap_or_default(),
                style.or(project.style).unwrap_or_default(),
                topic.or(project.topic).unwrap_or_default(),
            );
            debug!(?params, "Outline parameters resolved");

            let handle = session.pipeline()?.spawn_outline(project_id, params);
            if let Some(record) = follow(handle).await? {
                println!();
                info!(outline_id = record.id, "Outline stored");
                print_outline(&record);
            }
            Ok(())
        }

        OutlineCommands::Show {
            project_id,
            history,
            format,
        } => {
            let records = if history {
                session.repository.list_outlines(project_id).await?
            } else {
                session
                    .repository
                    .get_latest_outline(project_id)
                    .await?
                    .into_iter()
                    .collect()
            };
            if records.is_empty() {
                println!("Project {} has no outline yet", project_id);
                return Ok(());
            }
            match format {
                OutputFormat::Json if history => print_json(&records),
                OutputFormat::Json => print_json(&records[0]),
                OutputFormat::Human => {
                    for record in &records {
                        print_outline(record);
                        println!();
                    }
                    Ok(())
                }
            }
        }

        OutlineCommands::Save { project_id, file } => {
            let text = read_edit(&file).await?;
            let record = save_outline_edit(session.repository.as_ref(), project_id, &text).await?;
            println!(
                "Saved outline {} with {} chapters",
                record.id,
                record.document.chapters.len()
            );
            Ok(())
        }
    }
}

/// Handle chapter commands.
pub async fn handle_chapter_command(cmd: ChapterCommands, session: &Session) -> QuireResult<()> {
    match cmd {
        ChapterCommands::Generate {
            project_id,
            index,
            style,
            length,
        } => {
            let project = session.project(project_id).await?;
            let style = StyleParams::new(
                style
                    .or(project.style)
                    .unwrap_or_else(|| DEFAULT_STYLE.to_string()),
                length.unwrap_or(DEFAULT_CHAPTER_LENGTH),
            );

            let handle = session.pipeline()?.spawn_chapter(project_id, index, style);
            if let Some(chapter) = follow(handle).await? {
                println!();
                info!(chapter_id = chapter.id, "Chapter stored");
                println!(
                    "Saved chapter {} revision {} (status: {})",
                    chapter.chapter_index, chapter.id, chapter.status
                );
            }
            Ok(())
        }

        ChapterCommands::Show {
            project_id,
            index,
            history,
            format,
        } => {
            let revisions = if history {
                session.repository.chapter_history(project_id, index).await?
            } else {
                session
                    .repository
                    .get_chapter(project_id, index)
                    .await?
                    .into_iter()
                    .collect()
            };
            if revisions.is_empty() {
                println!("Chapter {} of project {} has not been written yet", index, project_id);
                return Ok(());
            }
            match format {
                OutputFormat::Json if history => print_json(&revisions),
                OutputFormat::Json => print_json(&revisions[0]),
                OutputFormat::Human => {
                    for chapter in &revisions {
                        print_chapter(chapter);
                        println!();
                    }
                    Ok(())
                }
            }
        }

        ChapterCommands::Save {
            project_id,
            index,
            file,
            title,
            status,
        } => {
            let mut edit = ChapterEdit::new(project_id, index, read_edit(&file).await?)
                .with_status(status);
            edit.title = title;
            let chapter = save_chapter_edit(session.repository.as_ref(), edit).await?;
            println!(
                "Saved chapter {} revision {} (status: {})",
                chapter.chapter_index, chapter.id, chapter.status
            );
            Ok(())
        }
    }
}

async fn read_edit(path: &Path) -> QuireResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        ValidationError::new(format!("cannot read {}: {}", path.display(), e)).into()
    })
}

/// Stream partial text to stdout until the run ends.
///
/// Ctrl-C cancels the run. Returns `None` when it was cancelled.
async fn follow<T>(mut handle: PipelineHandle<T>) -> QuireResult<Option<T>> {
    let cancel = handle.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling generation");
            cancel.cancel();
        }
    });

    let mut stdout = std::io::stdout();
    let mut result = Ok(None);
    while let Some(event) = handle.next_event().await {
        match event {
            PipelineEvent::Partial(text) => {
                print!("{}", text);
                if let Err(e) = stdout.flush() {
                    debug!(error = %e, "Failed to flush stdout");
                }
            }
            PipelineEvent::Completed(value) => result = Ok(Some(value)),
            PipelineEvent::Cancelled => {
                println!();
                println!("cancelled");
            }
            PipelineEvent::Failed(e) => result = Err(e.into()),
        }
    }

    interrupt.abort();
    result
}
