//! Icon, string table and archive patching of executables.
//!
//! [`ResourcePatcher`] validates the payloads, then writes all resources of one patch in a single
//! [`ResourceTransaction`]: either every resource is committed or the target is left as it was.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, error, info};

use crate::{constants::*, errors::*, icon::*, image::*, strings::*, transaction::*};

/// Resource ids and language used for the patched resources.
/// The ids are shared with the launcher stub reading the resources at runtime.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ResourceIds {
    /// Id of the `RT_GROUP_ICON` resource.
    pub icon_group:   WORD,
    /// Id of the `RT_ICON` resource holding the first image, the others follow consecutively.
    pub first_icon:   WORD,
    /// Id of the `RT_RCDATA` resource holding the archive.
    pub archive:      WORD,
    /// Id of the `RT_STRING` block holding the launcher strings.
    pub string_block: WORD,
    /// Language of every patched resource.
    pub language:     LANGID,
}
impl Default for ResourceIds {
    fn default() -> Self {
        Self {
            icon_group:   IDI_APPLICATION_ICON,
            first_icon:   IDI_FIRST_ICON_IMAGE,
            archive:      IDR_ARCHIVE,
            string_block: IDS_STRING_BLOCK,
            language:     LANGUAGE_ID_EN_US,
        }
    }
}

/// Description of a single patch of an executable.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct PatchRequest {
    /// Executable to patch.
    pub target:        PathBuf,
    /// Icon file whose images replace the icon of the target.
    pub icon:          PathBuf,
    /// Archive embedded into a launcher stub. Ignored unless `launcher_stub` is set.
    pub archive:       Option<PathBuf>,
    /// Console window title read by the launcher stub.
    pub console_title: String,
    /// Arguments the launcher stub passes to the embedded program.
    pub process_args:  String,
    /// Also write the launcher string table and the archive.
    pub launcher_stub: bool,
}
impl PatchRequest {
    /// Create a request replacing only the icon of the target.
    pub fn new<T: Into<PathBuf>, I: Into<PathBuf>>(target: T, icon: I) -> Self {
        Self {
            target: target.into(),
            icon: icon.into(),
            ..Default::default()
        }
    }

    /// Turn the request into a launcher stub patch with the given archive and strings.
    pub fn launcher<S: Into<String>, A: Into<String>>(
        mut self, archive: Option<PathBuf>, console_title: S, process_args: A,
    ) -> Self {
        self.archive = archive;
        self.console_title = console_title.into();
        self.process_args = process_args.into();
        self.launcher_stub = true;
        self
    }
}

/// Progress of a patch.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum PatchState {
    #[default]
    Idle,
    ContainerValidated,
    SessionOpen,
    IconsWritten,
    GroupWritten,
    StringsWritten,
    ArchiveWritten,
    Committed,
    Aborted,
}

/// Patches the resources of executables.
#[derive(Debug, Clone, Default)]
pub struct ResourcePatcher {
    ids:   ResourceIds,
    state: PatchState,
}
impl ResourcePatcher {
    pub fn new(ids: ResourceIds) -> Self {
        Self {
            ids,
            state: PatchState::Idle,
        }
    }

    /// Returns the resource ids used for patching.
    pub fn ids(&self) -> &ResourceIds { &self.ids }

    /// Returns the state reached by the last patch.
    pub fn state(&self) -> PatchState { self.state }

    /// Patch the target described by the request.
    ///
    /// The payload files are read and validated before the target is opened.
    /// Icon images left over from a previous icon with more images are removed.
    ///
    /// # Returns
    /// Returns an error if a payload file cannot be read or is invalid, or if the resources cannot be written.
    /// On any error before commit the target is unchanged.
    pub fn patch(&mut self, request: &PatchRequest) -> Result<(), PatchError> {
        self.state = PatchState::Idle;
        let result = self.run(request);
        if result.is_err() {
            self.transition(PatchState::Aborted);
        }
        result
    }

    fn run(&mut self, request: &PatchRequest) -> Result<(), PatchError> {
        let icon = read_file(&request.icon)?;
        let archive = match request.archive.as_deref() {
            Some(path) if request.launcher_stub && !path.as_os_str().is_empty() => {
                Some(read_file(path)?)
            }
            _ => None,
        };

        let (container, group) = IconContainer::parse(&icon, self.ids.first_icon)?;
        self.transition(PatchState::ContainerValidated);

        let strings = if request.launcher_stub {
            let mut table = StringSlotTable::default();
            table.set(IDS_CONSOLE_TITLE, &request.console_title)?;
            table.set(IDS_PROCESS_ARGUMENTS, &request.process_args)?;
            Some(table.encode()?)
        } else {
            None
        };

        let mut session = ResourceTransaction::open(&request.target)?;
        self.transition(PatchState::SessionOpen);

        let current_count = current_icon_count(&request.target, self.ids.icon_group);
        let mut operations = plan_icon_operations(&container, &group, &self.ids, current_count);
        let group_operation = operations.pop();
        for operation in operations {
            schedule(&mut session, operation)?;
        }
        self.transition(PatchState::IconsWritten);
        if let Some(operation) = group_operation {
            schedule(&mut session, operation)?;
        }
        self.transition(PatchState::GroupWritten);

        if let Some(strings) = strings {
            session.update(RT_STRING, self.ids.string_block, self.ids.language, &strings)?;
            self.transition(PatchState::StringsWritten);
        }
        if let Some(archive) = archive {
            session.update(RT_RCDATA, self.ids.archive, self.ids.language, &archive)?;
            self.transition(PatchState::ArchiveWritten);
        }

        session.commit()?;
        self.transition(PatchState::Committed);
        info!("patched resources of {:?}", request.target);
        Ok(())
    }

    fn transition(&mut self, state: PatchState) {
        debug!("patch state: {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

/// Plan the operations replacing the icon of an executable currently holding `current_count` icon images.
///
/// Images beyond the new image count are deleted first, then every image is written under its id,
/// and the group icon directory is written last.
pub fn plan_icon_operations(
    container: &IconContainer, group: &GroupIconDirectory, ids: &ResourceIds, current_count: u16,
) -> Vec<ResourceOperation> {
    let new_count = container.count();
    let mut operations = Vec::with_capacity(current_count.max(new_count) as usize + 1);
    for index in new_count..current_count.max(new_count) {
        operations.push(ResourceOperation::Delete {
            kind:     RT_ICON,
            id:       ids.first_icon.wrapping_add(index),
            language: ids.language,
        });
    }
    for (image, id) in container.images().zip(group.ids()) {
        operations.push(ResourceOperation::Update {
            kind:     RT_ICON,
            id,
            language: ids.language,
            data:     image.to_vec(),
        });
    }
    operations.push(ResourceOperation::Update {
        kind:     RT_GROUP_ICON,
        id:       ids.icon_group,
        language: ids.language,
        data:     group.build(),
    });
    operations
}

/// Returns the number of images in the icon group of the executable, or 0 if it cannot be determined.
///
/// The group is looked up in any language, while stale images are only deleted in the language being patched.
/// Images of a group stored under another language are left in place.
pub fn current_icon_count<P: AsRef<Path>>(target: P, icon_group: WORD) -> u16 {
    let count = Image::parse_file(target.as_ref()).ok().and_then(|image| {
        let (_, data) = image.resource_directory()?.find_data(RT_GROUP_ICON, icon_group)?;
        GroupIconDirectory::parse(data.data()).ok().map(|group| group.count())
    });
    debug!("current icon count of {:?}: {:?}", target.as_ref(), count);
    count.unwrap_or_default()
}

fn schedule(session: &mut ResourceTransaction, operation: ResourceOperation) -> Result<(), TransactionError> {
    match operation {
        ResourceOperation::Update { kind, id, language, data } => session.update(kind, id, language, &data),
        ResourceOperation::Delete { kind, id, language } => session.delete(kind, id, language),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, PatchError> {
    fs::read(path).map_err(|e| PatchError::FileRead(path.to_path_buf(), e))
}

/// Replace the icon of the executable and, for a launcher stub, embed the archive and launcher strings.
///
/// The archive is skipped if no path or an empty path is given.
///
/// # Returns
/// Returns `false` if patching failed. The failure is logged.
pub fn replace_resources(
    target: &Path, archive: Option<&Path>, icon: &Path, console_title: &str, process_args: &str,
    launcher_stub: bool,
) -> bool {
    let mut request = PatchRequest::new(target, icon);
    if launcher_stub {
        request = request.launcher(archive.map(Path::to_path_buf), console_title, process_args);
    }
    match ResourcePatcher::default().patch(&request) {
        Ok(()) => true,
        Err(e) => {
            error!("failed to patch resources of {:?}: {}", target, e);
            false
        }
    }
}
