use std::path::{Path, PathBuf};

/// Values substituted into every manifest template of one deploy.
///
/// `run` is generated fresh per invocation and shared by all templates
/// rendered in that invocation.
#[derive(Debug, Clone)]
pub struct Substitutions {
    pub image: String,
    pub app: String,
    pub run: String,
}

impl Substitutions {
    fn get(&self, name: &str) -> Option<&str> {
        match name {
            "image" => Some(&self.image),
            "app" => Some(&self.app),
            "run" => Some(&self.run),
            _ => None,
        }
    }
}

/// Substitute `$name` / `${name}` placeholders into a template.
///
/// `$$` renders a literal `$`. Templates may only reference the three
/// recognized variables; anything else is an error rather than passing
/// through silently.
pub fn render(template: &str, vars: &Substitutions) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some((_, '$')) => {
                chars.next();
                out.push('$');
            }
            Some((_, '{')) => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) => name.push(c),
                        None => return Err(RenderError::Dangling { offset }),
                    }
                }
                out.push_str(lookup(vars, &name, offset)?);
            }
            Some((_, c)) if c.is_ascii_alphabetic() || *c == '_' => {
                let mut name = String::new();
                while let Some((_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '_' {
                        name.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(lookup(vars, &name, offset)?);
            }
            _ => return Err(RenderError::Dangling { offset }),
        }
    }

    Ok(out)
}

fn lookup<'a>(
    vars: &'a Substitutions,
    name: &str,
    offset: usize,
) -> Result<&'a str, RenderError> {
    if name.is_empty() {
        return Err(RenderError::Dangling { offset });
    }
    vars.get(name).ok_or_else(|| RenderError::UnknownPlaceholder {
        name: name.to_owned(),
    })
}

/// Recursively collect the template files under a directory.
///
/// Returned paths are relative to `templates_dir` so callers can mirror
/// the tree into the output directory. Sorted for a stable render order.
pub fn template_files(templates_dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
    let mut files = Vec::new();
    collect(templates_dir, Path::new(""), &mut files)?;
    files.sort();
    Ok(files)
}

fn collect(
    root: &Path,
    relative: &Path,
    files: &mut Vec<PathBuf>,
) -> Result<(), RenderError> {
    let dir = root.join(relative);
    let entries = std::fs::read_dir(&dir).map_err(|e| RenderError::ReadDir {
        path: dir.clone(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| RenderError::ReadDir {
            path: dir.clone(),
            source: e,
        })?;
        let rel = relative.join(entry.file_name());
        if entry.path().is_dir() {
            collect(root, &rel, files)?;
        } else {
            files.push(rel);
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template references unknown placeholder ${name} — only $image, $app and $run are recognized")]
    UnknownPlaceholder { name: String },

    #[error("invalid placeholder at byte {offset} — lone `$` (use `$$` for a literal dollar)")]
    Dangling { offset: usize },

    #[error("failed to read templates directory {path}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}
