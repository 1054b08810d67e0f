//! Project management command handlers.

use super::commands::{OutputFormat, ProjectCommands};
use super::render::{print_json, print_project};
use quire::{ArtifactRepository, NewProject, ProjectUpdate, QuireResult, ValidationError};

/// Handle project management commands.
pub async fn handle_project_command(
    cmd: ProjectCommands,
    repo: &dyn ArtifactRepository,
) -> QuireResult<()> {
    match cmd {
        ProjectCommands::Create {
            name,
            author,
            theme,
            style,
            topic,
        } => {
            let project = NewProject {
                name,
                author,
                theme,
                style,
                topic,
                ai_model: None,
                settings: None,
            };
            let created = repo.create_project(&project).await?;
            println!("Created project {} ({})", created.id, created.name);
            Ok(())
        }

        ProjectCommands::Show { id, format } => {
            let project = repo
                .get_project(id)
                .await?
                .ok_or_else(|| ValidationError::new(format!("project {} does not exist", id)))?;
            match format {
                OutputFormat::Json => print_json(&project),
                OutputFormat::Human => {
                    print_project(&project);
                    Ok(())
                }
            }
        }

        ProjectCommands::List { format } => {
            let projects = repo.list_projects().await?;
            match format {
                OutputFormat::Json => print_json(&projects),
                OutputFormat::Human => {
                    if projects.is_empty() {
                        println!("No projects yet. Create one with `quire project create --name <name>`.");
                    }
                    for project in &projects {
                        println!(
                            "{:>4}  {:<32}  {:<12}  {}",
                            project.id,
                            project.name,
                            project.status,
                            project.last_modified.format("%Y-%m-%d %H:%M")
                        );
                    }
                    Ok(())
                }
            }
        }

        ProjectCommands::Update { id, set } => {
            let update = ProjectUpdate::from_fields(set)?;
            if repo.update_project(id, &update).await? {
                println!("Updated project {}", id);
            } else {
                println!("No changes applied to project {}", id);
            }
            Ok(())
        }

        ProjectCommands::Delete { id } => {
            if repo.delete_project(id).await? {
                println!("Deleted project {}", id);
            } else {
                println!("Project {} does not exist", id);
            }
            Ok(())
        }
    }
}
