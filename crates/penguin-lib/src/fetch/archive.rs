use crate::command::ShellCommand;
use std::path::Path;

/// Directory an archive unpacks into when no name was configured: the file
/// name up to the first `.tar`, or the whole file name when there is none.
pub fn derive_directory_name(artifact: &Path) -> Option<String> {
    let file_name = artifact.file_name()?.to_string_lossy();
    let directory_name = match file_name.find(".tar") {
        Some(end) => &file_name[..end],
        None => &file_name[..],
    };
    Some(directory_name.to_string())
}

/// `tar` invocation unpacking `archive` into `destination`. Compression is
/// detected by `tar` itself.
pub fn extraction_command(
    archive: &Path,
    destination: &Path,
    strip_leading_component: bool,
) -> ShellCommand {
    let command = ShellCommand::new("tar").args([
        "--extract".to_string(),
        format!("--file={}", archive.display()),
        format!("--directory={}", destination.display()),
    ]);

    if strip_leading_component {
        command.arg("--strip-components=1")
    } else {
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_directory_name_strips_tar_suffixes() {
        for (artifact, expected) in [
            ("/sources/binutils-2.21.tar", "binutils-2.21"),
            ("/sources/gcc-4.6.2.tar.gz", "gcc-4.6.2"),
            ("/sources/mpfr-3.1.0.tar.bz2", "mpfr-3.1.0"),
            ("/sources/xz-5.0.3.tar.xz", "xz-5.0.3"),
        ] {
            assert_eq!(
                derive_directory_name(Path::new(artifact)).as_deref(),
                Some(expected)
            );
        }
    }

    #[test]
    fn test_derive_directory_name_truncates_at_first_tar() {
        assert_eq!(
            derive_directory_name(Path::new("/sources/a.tar.b.tar.gz")).as_deref(),
            Some("a")
        );
    }

    #[test]
    fn test_derive_directory_name_without_tar_uses_file_name() {
        assert_eq!(
            derive_directory_name(Path::new("/sources/zlib-1.2.5.zip")).as_deref(),
            Some("zlib-1.2.5.zip")
        );
    }

    #[test]
    fn test_derive_directory_name_without_file_name() {
        assert_eq!(derive_directory_name(Path::new("/")), None);
    }

    #[test]
    fn test_extraction_into_explicit_directory_strips_one_component() {
        let command = extraction_command(
            Path::new("/sources/gcc-4.6.2.tar.bz2"),
            Path::new("/sources/gcc"),
            true,
        );
        assert_eq!(
            command.to_string(),
            "tar --extract --file=/sources/gcc-4.6.2.tar.bz2 --directory=/sources/gcc --strip-components=1"
        );
    }

    #[test]
    fn test_extraction_in_place_keeps_archive_layout() {
        let command = extraction_command(
            Path::new("/sources/gcc-4.6.2.tar.bz2"),
            Path::new("/sources"),
            false,
        );
        assert_eq!(
            command.to_string(),
            "tar --extract --file=/sources/gcc-4.6.2.tar.bz2 --directory=/sources"
        );
    }
}
