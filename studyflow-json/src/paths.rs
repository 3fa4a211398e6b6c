use directories::ProjectDirs;
use std::path::PathBuf;

pub fn data_root() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("com", "studyflow", "StudyFlow") {
        pd.data_dir().to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

/// Store file and its backup directory under `root`.
pub fn store_files(root: &std::path::Path) -> (PathBuf, PathBuf) {
    (root.join("studyflow.json"), root.join("backups"))
}

pub fn default_question_bank() -> PathBuf {
    data_root().join("question_bank.json")
}
