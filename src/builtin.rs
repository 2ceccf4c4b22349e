use crate::command::{CommandFactory, ExecutableCommand, Flow};
use crate::env::Environment;
use crate::error::CommandError;
use crate::fs_ops;
use crate::interpreter::Factory;
use crate::os_info::{self, OsCommand};
use crate::table::render_table;
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::Write;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`). Their positional fields
/// are the arity guard: a line with too few or too many arguments fails to parse and
/// the command is not created.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "ls" or "cp".
    fn name() -> &'static str;

    /// Executes the command using the provided output stream and environment.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Flow, CommandError> {
        <T as BuiltinCommand>::execute(*self, stdout, env)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        // `--` ends option parsing, so names like `help` or `-x` stay positional.
        let argv: Vec<&str> = std::iter::once("--").chain(args.iter().copied()).collect();
        match T::from_args(&[name], &argv) {
            Ok(cmd) => Some(Box::new(cmd)),
            Err(EarlyExit { output, .. }) => {
                log::debug!("{name}: arguments rejected: {}", output.trim_end());
                None
            }
        }
    }
}

/// Reject empty path arguments (e.g. from `cd --`) as unusable input.
fn non_empty<'a>(command: &str, path: &'a str) -> Result<&'a str, CommandError> {
    if path.is_empty() {
        Err(CommandError::InvalidArgument(format!("{command}: empty path")))
    } else {
        Ok(path)
    }
}

#[derive(FromArgs)]
/// End the session.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        ".exit"
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<Flow, CommandError> {
        Ok(Flow::Exit)
    }
}

#[derive(FromArgs)]
/// List the entries of the current directory, directories first.
pub struct Ls {}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        let rows: Vec<Vec<String>> = fs_ops::list(env.current_dir())?
            .into_iter()
            .map(|entry| {
                let kind = if entry.is_dir { "directory" } else { "file" };
                vec![entry.name, kind.to_string()]
            })
            .collect();
        stdout.write_all(render_table(&["Name", "Type"], &rows).as_bytes())?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Go one directory up.
pub struct Up {}

impl BuiltinCommand for Up {
    fn name() -> &'static str {
        "up"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        env.change_dir("..")?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: String,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        env.change_dir(non_empty("cd", &self.target)?)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print a file to standard output.
pub struct Cat {
    #[argh(positional)]
    /// file to print.
    pub file: String,
}

impl BuiltinCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        let path = env.resolve(non_empty("cat", &self.file)?);
        match fs_ops::stream_to(&path, stdout)? {
            Some(b'\n') | None => {}
            Some(_) => writeln!(stdout)?,
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Create an empty file in the current directory. Fails if it already exists.
pub struct Add {
    #[argh(positional)]
    /// name of the new file.
    pub name: String,
}

impl BuiltinCommand for Add {
    fn name() -> &'static str {
        "add"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        let path = env.resolve(non_empty("add", &self.name)?);
        fs_ops::create_empty(&path)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Rename a file. Fails if the new name is taken.
pub struct Rn {
    #[argh(positional)]
    /// file to rename.
    pub source: String,
    #[argh(positional)]
    /// new name.
    pub target: String,
}

impl BuiltinCommand for Rn {
    fn name() -> &'static str {
        "rn"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        let source = env.resolve(non_empty("rn", &self.source)?);
        let target = env.resolve(non_empty("rn", &self.target)?);
        if fs::symlink_metadata(&target).is_ok() {
            return Err(CommandError::Failed(format!(
                "rn: {} already exists",
                target.display()
            )));
        }
        fs::rename(&source, &target)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Copy a file or a directory tree. The destination must not exist.
pub struct Cp {
    #[argh(positional)]
    /// file or directory to copy.
    pub source: String,
    #[argh(positional)]
    /// path of the copy; must not exist.
    pub target: String,
}

impl BuiltinCommand for Cp {
    fn name() -> &'static str {
        "cp"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        let source = env.resolve(non_empty("cp", &self.source)?);
        let target = env.resolve(non_empty("cp", &self.target)?);
        fs_ops::copy(&source, &target)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Move a file or a directory tree: copy, then remove the source.
pub struct Mv {
    #[argh(positional)]
    /// file or directory to move.
    pub source: String,
    #[argh(positional)]
    /// new location; must not exist or lie inside the source.
    pub target: String,
}

impl BuiltinCommand for Mv {
    fn name() -> &'static str {
        "mv"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        let source = env.resolve(non_empty("mv", &self.source)?);
        let target = env.resolve(non_empty("mv", &self.target)?);
        fs_ops::move_path(&source, &target)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Remove a file.
pub struct Rm {
    #[argh(positional)]
    /// file to remove.
    pub file: String,
}

impl BuiltinCommand for Rm {
    fn name() -> &'static str {
        "rm"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        let path = env.resolve(non_empty("rm", &self.file)?);
        fs_ops::remove(&path, false)?;
        Ok(Flow::Continue)
    }
}

fn parse_os_command(value: &str) -> Result<OsCommand, String> {
    OsCommand::from_name(value).ok_or_else(|| format!("unknown os command: {value}"))
}

#[derive(FromArgs)]
/// Print information about the operating system.
pub struct Os {
    #[argh(positional, from_str_fn(parse_os_command))]
    /// one of EOL, cpus, homedir, username, architecture.
    pub command: OsCommand,
}

impl BuiltinCommand for Os {
    fn name() -> &'static str {
        "os"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        match self.command {
            OsCommand::Eol => writeln!(stdout, "{:?}", os_info::LINE_ENDING)?,
            OsCommand::Cpus => {
                let rows: Vec<Vec<String>> = os_info::cpus()
                    .into_iter()
                    .map(|cpu| {
                        let speed = cpu
                            .speed_mhz
                            .map_or_else(|| "unknown".to_string(), |mhz| mhz.to_string());
                        vec![cpu.model, speed]
                    })
                    .collect();
                stdout.write_all(render_table(&["Model", "Speed"], &rows).as_bytes())?;
            }
            OsCommand::HomeDir => writeln!(stdout, "{}", env.home_dir.display())?,
            OsCommand::UserName => {
                let name = os_info::user_name()
                    .ok_or_else(|| CommandError::Failed("os: user name unavailable".to_string()))?;
                writeln!(stdout, "{name}")?;
            }
            OsCommand::Architecture => writeln!(stdout, "{}", os_info::architecture())?,
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print the SHA-256 digest of a file.
pub struct Hash {
    #[argh(positional)]
    /// file to hash.
    pub file: String,
}

impl BuiltinCommand for Hash {
    fn name() -> &'static str {
        "hash"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        let path = env.resolve(non_empty("hash", &self.file)?);
        writeln!(stdout, "{}", fs_ops::hash_file(&path)?)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Compress a file with Brotli.
pub struct Compress {
    #[argh(positional)]
    /// file to compress.
    pub source: String,
    #[argh(positional)]
    /// path of the compressed file; must differ from the source.
    pub target: String,
}

impl BuiltinCommand for Compress {
    fn name() -> &'static str {
        "compress"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        let source = env.resolve(non_empty("compress", &self.source)?);
        let target = env.resolve(non_empty("compress", &self.target)?);
        fs_ops::compress(&source, &target)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Decompress a Brotli-compressed file.
pub struct Decompress {
    #[argh(positional)]
    /// brotli-compressed file.
    pub source: String,
    #[argh(positional)]
    /// path of the restored file; must differ from the source.
    pub target: String,
}

impl BuiltinCommand for Decompress {
    fn name() -> &'static str {
        "decompress"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow, CommandError> {
        let source = env.resolve(non_empty("decompress", &self.source)?);
        let target = env.resolve(non_empty("decompress", &self.target)?);
        fs_ops::decompress(&source, &target)?;
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::tests::lock_current_dir;
    use std::env as stdenv;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Environment) {
        let temp = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap();
        let env = Environment::with_dirs("Guest", root.clone(), root);
        (temp, env)
    }

    fn create<T: BuiltinCommand + 'static>(
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        Factory::<T>::default().try_create(env, name, args)
    }

    fn root(env: &Environment) -> PathBuf {
        env.current_dir().to_path_buf()
    }

    #[test]
    fn test_factory_matches_name_and_arity() {
        let (_temp, env) = setup();
        assert!(create::<Ls>(&env, "ls", &[]).is_some());
        assert!(create::<Ls>(&env, "ls", &["extra"]).is_none());
        assert!(create::<Ls>(&env, "dir", &[]).is_none());
        assert!(create::<Cd>(&env, "cd", &[]).is_none());
        assert!(create::<Cd>(&env, "cd", &["a", "b"]).is_none());
        assert!(create::<Cp>(&env, "cp", &["a"]).is_none());
        assert!(create::<Cp>(&env, "cp", &["a", "b"]).is_some());
        assert!(create::<Exit>(&env, ".exit", &[]).is_some());
    }

    #[test]
    fn test_factory_takes_help_and_dashes_literally() {
        let (_temp, env) = setup();
        assert!(create::<Cd>(&env, "cd", &["help"]).is_some());
        assert!(create::<Cat>(&env, "cat", &["--help"]).is_some());
        assert!(create::<Rm>(&env, "rm", &["-x"]).is_some());
    }

    #[test]
    fn test_os_factory_resolves_sub_commands() {
        let (_temp, env) = setup();
        for name in ["EOL", "cpus", "homedir", "username", "architecture"] {
            assert!(create::<Os>(&env, "os", &[name]).is_some(), "{name}");
        }
        assert!(create::<Os>(&env, "os", &["kernel"]).is_none());
        assert!(create::<Os>(&env, "os", &[]).is_none());
    }

    #[test]
    fn test_exit_requests_end_of_session() {
        let (_temp, mut env) = setup();
        let flow = Exit {}.execute(&mut Vec::new(), &mut env).unwrap();
        assert_eq!(flow, Flow::Exit);
    }

    #[test]
    fn test_ls_prints_table() {
        let (_temp, mut env) = setup();
        fs::create_dir(root(&env).join("docs")).unwrap();
        fs::write(root(&env).join("a.txt"), "").unwrap();

        let mut out = Vec::new();
        Ls {}.execute(&mut out, &mut env).unwrap();
        let s = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = s.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("docs") && lines[2].ends_with("directory"));
        assert!(lines[3].contains("a.txt") && lines[3].ends_with("file"));
    }

    #[test]
    fn test_cd_and_up() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let (_temp, mut env) = setup();
        let base = root(&env);
        fs::create_dir(base.join("my folder")).unwrap();

        Cd {
            target: "my folder".to_string(),
        }
        .execute(&mut Vec::new(), &mut env)
        .unwrap();
        assert_eq!(env.current_dir(), base.join("my folder"));

        Up {}.execute(&mut Vec::new(), &mut env).unwrap();
        assert_eq!(env.current_dir(), base);

        let err = Cd {
            target: String::new(),
        }
        .execute(&mut Vec::new(), &mut env)
        .unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(_)));

        stdenv::set_current_dir(orig).unwrap();
    }

    #[test]
    fn test_cat_adds_missing_trailing_newline() {
        let (_temp, mut env) = setup();
        fs::write(root(&env).join("a.txt"), "hello").unwrap();
        fs::write(root(&env).join("b.txt"), "hello\nworld\n").unwrap();

        let mut out = Vec::new();
        Cat {
            file: "a.txt".to_string(),
        }
        .execute(&mut out, &mut env)
        .unwrap();
        assert_eq!(out, b"hello\n");

        let mut out = Vec::new();
        Cat {
            file: "b.txt".to_string(),
        }
        .execute(&mut out, &mut env)
        .unwrap();
        assert_eq!(out, b"hello\nworld\n");
    }

    #[test]
    fn test_cat_missing_file_is_io_error() {
        let (_temp, mut env) = setup();
        let err = Cat {
            file: "missing.txt".to_string(),
        }
        .execute(&mut Vec::new(), &mut env)
        .unwrap_err();
        assert!(matches!(err, CommandError::Io(_)));
    }

    #[test]
    fn test_add_is_exclusive() {
        let (_temp, mut env) = setup();
        let add = || Add {
            name: "new.txt".to_string(),
        };
        add().execute(&mut Vec::new(), &mut env).unwrap();
        assert_eq!(fs::read(root(&env).join("new.txt")).unwrap(), b"");

        fs::write(root(&env).join("new.txt"), "kept").unwrap();
        assert!(add().execute(&mut Vec::new(), &mut env).is_err());
        assert_eq!(fs::read_to_string(root(&env).join("new.txt")).unwrap(), "kept");
    }

    #[test]
    fn test_rn_refuses_existing_target() {
        let (_temp, mut env) = setup();
        fs::write(root(&env).join("a.txt"), "a").unwrap();
        fs::write(root(&env).join("b.txt"), "b").unwrap();

        let err = Rn {
            source: "a.txt".to_string(),
            target: "b.txt".to_string(),
        }
        .execute(&mut Vec::new(), &mut env)
        .unwrap_err();
        assert!(matches!(err, CommandError::Failed(_)));
        assert_eq!(fs::read_to_string(root(&env).join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(root(&env).join("b.txt")).unwrap(), "b");

        Rn {
            source: "a.txt".to_string(),
            target: "c.txt".to_string(),
        }
        .execute(&mut Vec::new(), &mut env)
        .unwrap();
        assert!(!root(&env).join("a.txt").exists());
        assert_eq!(fs::read_to_string(root(&env).join("c.txt")).unwrap(), "a");
    }

    #[test]
    fn test_rm_removes_files_only() {
        let (_temp, mut env) = setup();
        fs::write(root(&env).join("a.txt"), "a").unwrap();
        fs::create_dir(root(&env).join("dir")).unwrap();

        Rm {
            file: "a.txt".to_string(),
        }
        .execute(&mut Vec::new(), &mut env)
        .unwrap();
        assert!(!root(&env).join("a.txt").exists());

        let err = Rm {
            file: "dir".to_string(),
        }
        .execute(&mut Vec::new(), &mut env)
        .unwrap_err();
        assert!(matches!(err, CommandError::Io(_)));
        assert!(root(&env).join("dir").exists());
    }

    #[test]
    fn test_hash_prints_hex_digest() {
        let (_temp, mut env) = setup();
        fs::write(root(&env).join("empty.txt"), "").unwrap();

        let mut out = Vec::new();
        Hash {
            file: "empty.txt".to_string(),
        }
        .execute(&mut out, &mut env)
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n"
        );
    }

    #[test]
    fn test_decompress_missing_source_creates_nothing() {
        let (_temp, mut env) = setup();

        let err = Decompress {
            source: "missing.br".to_string(),
            target: "out.txt".to_string(),
        }
        .execute(&mut Vec::new(), &mut env)
        .unwrap_err();
        assert!(matches!(err, CommandError::Io(_)));
        assert!(!root(&env).join("out.txt").exists());
    }

    #[test]
    fn test_os_prints_line_ending_and_home() {
        let (_temp, mut env) = setup();

        let mut out = Vec::new();
        Os {
            command: OsCommand::Eol,
        }
        .execute(&mut out, &mut env)
        .unwrap();
        let expected = if cfg!(windows) { "\"\\r\\n\"\n" } else { "\"\\n\"\n" };
        assert_eq!(String::from_utf8(out).unwrap(), expected);

        let mut out = Vec::new();
        Os {
            command: OsCommand::HomeDir,
        }
        .execute(&mut out, &mut env)
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", env.home_dir.display())
        );
    }

    #[test]
    fn test_os_cpus_has_row_per_core() {
        let (_temp, mut env) = setup();
        let mut out = Vec::new();
        Os {
            command: OsCommand::Cpus,
        }
        .execute(&mut out, &mut env)
        .unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.starts_with("(index) | Model"));
        assert_eq!(s.lines().count(), os_info::cpus().len() + 2);
    }
}
