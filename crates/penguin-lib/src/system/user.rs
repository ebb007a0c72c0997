use super::SystemError;
use crate::command::{CommandRunner, ShellCommand};
use nix::unistd::{Gid, Uid, chown, setgid, setgroups, setuid};
use std::path::Path;

pub const PASSWD_PATH: &str = "/etc/passwd";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserIds {
    pub uid: u32,
    pub gid: u32,
}

/// Looks `user` up in the contents of a `passwd` file.
pub fn find_user_ids(passwd: &str, user: &str) -> Option<UserIds> {
    passwd.lines().find_map(|line| {
        let mut fields = line.split(':');
        if fields.next()? != user {
            return None;
        }
        let mut ids = fields.skip(1);
        let uid = ids.next()?.trim().parse().ok()?;
        let gid = ids.next()?.trim().parse().ok()?;
        Some(UserIds { uid, gid })
    })
}

async fn read_user_ids(passwd_path: &Path, user: &str) -> Result<Option<UserIds>, SystemError> {
    let passwd = tokio::fs::read_to_string(passwd_path)
        .await
        .map_err(|source| SystemError::UserLookup {
            path: passwd_path.to_path_buf(),
            source,
        })?;
    Ok(find_user_ids(&passwd, user))
}

/// Returns the ids of `user`, creating the user and its group first when
/// `passwd_path` does not list it.
pub async fn get_or_create_user<R: CommandRunner>(
    runner: &R,
    passwd_path: &Path,
    user: &str,
) -> Result<UserIds, SystemError> {
    if let Some(ids) = read_user_ids(passwd_path, user).await? {
        tracing::debug!(user, uid = ids.uid, gid = ids.gid, "Build user exists");
        return Ok(ids);
    }

    runner
        .execute(
            &ShellCommand::new("useradd")
                .args(["-M", "-U", user])
                .explain(format!("Creating the build user \"{user}\" and its group.")),
        )
        .await?;

    read_user_ids(passwd_path, user)
        .await?
        .ok_or_else(|| SystemError::UserCreation {
            user: user.to_string(),
        })
}

/// Gives `user` ownership of `paths`.
pub fn hand_over(paths: &[&Path], ids: UserIds) -> Result<(), SystemError> {
    for path in paths {
        tracing::debug!(path = %path.display(), uid = ids.uid, "Changing owner");
        chown(*path, Some(Uid::from_raw(ids.uid)), Some(Gid::from_raw(ids.gid))).map_err(
            |source| SystemError::Ownership {
                path: path.to_path_buf(),
                source,
            },
        )?;
    }
    Ok(())
}

/// Permanently switches the process to `ids`. Groups go first; once the
/// user id changes the process can no longer change them.
pub fn drop_privileges(ids: UserIds) -> Result<(), SystemError> {
    let gid = Gid::from_raw(ids.gid);
    setgroups(&[gid]).map_err(SystemError::Privileges)?;
    setgid(gid).map_err(SystemError::Privileges)?;
    setuid(Uid::from_raw(ids.uid)).map_err(SystemError::Privileges)?;
    tracing::info!(uid = ids.uid, gid = ids.gid, "Dropped root privileges");
    Ok(())
}
