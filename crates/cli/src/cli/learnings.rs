use std::path::Path;

pub fn show(repo: &Path, task: &str, tags: &[String]) -> anyhow::Result<()> {
    let block = af_learnings::load_relevant_learnings(repo, task, tags)?;
    if block.is_empty() {
        eprintln!("No relevant learnings in {}", repo.display());
    } else {
        println!("{block}");
    }
    Ok(())
}
