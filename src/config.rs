use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the database, relative to the project root
pub const DATA_DIR: &str = ".campus";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CampusConfig {
    /// Database file, relative to the directory the config lives in
    pub database: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("campus.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(DATA_DIR).join("campus.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<CampusConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: CampusConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &CampusConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Database path to use: an explicit flag wins, then the config file, then the default.
/// Relative paths from the config are resolved against the config's directory.
pub fn resolve_database_path(
    explicit: Option<&Path>,
    config: Option<&CampusConfig>,
    config_path: &Path,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    match config.and_then(|c| c.database.as_deref()) {
        Some(db) if Path::new(db).is_absolute() => PathBuf::from(db),
        Some(db) => base.join(db),
        None => default_database_path_in(base),
    }
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Keep the data directory out of version control
pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = format!("{}/", DATA_DIR);

    let mut content = if gitignore_path.exists() {
        std::fs::read_to_string(&gitignore_path)?
    } else {
        String::new()
    };

    if content.lines().any(|line| line.trim() == entry) {
        return Ok(());
    }

    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campus.toml");
        let config = CampusConfig { database: Some("data/campus.db".to_string()) };

        write_config(&path, &config, false).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), Some(config.clone()));

        assert!(write_config(&path, &config, false).is_err());
        assert!(write_config(&path, &config, true).is_ok());
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("campus.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_resolve_database_path() {
        let config_path = Path::new("/srv/campus/campus.toml");
        let config = CampusConfig { database: Some("data/campus.db".to_string()) };

        assert_eq!(
            resolve_database_path(Some(Path::new("x.db")), Some(&config), config_path),
            PathBuf::from("x.db")
        );
        assert_eq!(
            resolve_database_path(None, Some(&config), config_path),
            PathBuf::from("/srv/campus/data/campus.db")
        );
        assert_eq!(
            resolve_database_path(None, None, Path::new("campus.toml")),
            PathBuf::from("./.campus/campus.db")
        );
    }

    #[test]
    fn test_ensure_gitignore_appends_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "target/").unwrap();

        ensure_gitignore(dir.path()).unwrap();
        ensure_gitignore(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(content, "target/\n.campus/\n");
    }
}
