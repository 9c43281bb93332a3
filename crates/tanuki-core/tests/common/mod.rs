#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tanuki_core::{Blob, Cursor, Error, Group, PageResult, Project, RemoteApi, Result};

/// One remote call as seen by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Groups(Cursor),
    Projects(u64, Cursor),
    Blobs(u64, Cursor),
}

/// In-memory GitLab serving pre-paginated data with page-number cursors.
#[derive(Default)]
pub struct FakeApi {
    groups: Vec<Vec<Group>>,
    projects: HashMap<u64, Vec<Vec<Project>>>,
    blobs: HashMap<u64, Vec<Vec<Blob>>>,
    missing_groups: HashSet<u64>,
    missing_projects: HashSet<u64>,
    unauthorized_projects: HashSet<u64>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_pages(mut self, pages: Vec<Vec<Group>>) -> Self {
        self.groups = pages;
        self
    }

    pub fn project_pages(mut self, group_id: u64, pages: Vec<Vec<Project>>) -> Self {
        self.projects.insert(group_id, pages);
        self
    }

    pub fn blob_pages(mut self, project_id: u64, pages: Vec<Vec<Blob>>) -> Self {
        self.blobs.insert(project_id, pages);
        self
    }

    pub fn missing_group(mut self, group_id: u64) -> Self {
        self.missing_groups.insert(group_id);
        self
    }

    pub fn missing_project(mut self, project_id: u64) -> Self {
        self.missing_projects.insert(project_id);
        self
    }

    pub fn unauthorized_project(mut self, project_id: u64) -> Self {
        self.unauthorized_projects.insert(project_id);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn blob_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Blobs(..)))
            .count()
    }

    pub fn project_calls(&self) -> Vec<u64> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                Call::Projects(id, _) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn blob_projects(&self) -> Vec<u64> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                Call::Blobs(id, _) => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn serve<T: Clone>(pages: &[Vec<T>], cursor: &Cursor) -> PageResult<T> {
    let Cursor::Page { number, size } = cursor else {
        panic!("fake only serves page-number cursors, got {cursor:?}");
    };
    let idx = (*number as usize).saturating_sub(1);
    let items = pages.get(idx).cloned().unwrap_or_default();
    let next = if idx + 1 < pages.len() { number + 1 } else { 0 };
    PageResult::new(items, Cursor::Page { number: next, size: *size })
}

#[async_trait]
impl RemoteApi for FakeApi {
    async fn search_groups(&self, _query: &str, cursor: Cursor) -> Result<PageResult<Group>> {
        self.record(Call::Groups(cursor.clone()));
        Ok(serve(&self.groups, &cursor))
    }

    async fn list_group_projects(
        &self,
        group_id: u64,
        cursor: Cursor,
    ) -> Result<PageResult<Project>> {
        self.record(Call::Projects(group_id, cursor.clone()));
        if self.missing_groups.contains(&group_id) {
            return Err(Error::NotFound(format!("group {group_id}")));
        }
        let pages = self.projects.get(&group_id).cloned().unwrap_or_default();
        Ok(serve(&pages, &cursor))
    }

    async fn search_project_blobs(
        &self,
        project_id: u64,
        _query: &str,
        cursor: Cursor,
    ) -> Result<PageResult<Blob>> {
        self.record(Call::Blobs(project_id, cursor.clone()));
        if self.unauthorized_projects.contains(&project_id) {
            return Err(Error::Authentication("401 Unauthorized".into()));
        }
        if self.missing_projects.contains(&project_id) {
            return Err(Error::NotFound(format!("project {project_id}")));
        }
        let pages = self.blobs.get(&project_id).cloned().unwrap_or_default();
        Ok(serve(&pages, &cursor))
    }
}

pub fn project(id: u64) -> Project {
    Project::new(id, format!("project-{id}"), format!("https://git.example/p{id}"))
}

pub fn blob(project_id: u64, label: &str) -> Blob {
    Blob {
        project_id,
        filename: format!("{label}.rs"),
        path: format!("src/{label}.rs"),
        git_ref: "main".into(),
        start_line: 1,
        data: label.to_string(),
    }
}

/// `groups` groups, `projects` projects each, `pages` blob pages per project.
///
/// Group ids are 1.., project ids are `group * 100 + n`, blob data is
/// `g{group}p{project}k{page}`.
pub fn grid(groups: u64, projects: u64, pages: u64) -> FakeApi {
    let mut api = FakeApi::new().group_pages(vec![
        (1..=groups).map(|g| Group::new(g, format!("group-{g}"))).collect(),
    ]);
    for g in 1..=groups {
        let ids: Vec<u64> = (1..=projects).map(|p| g * 100 + p).collect();
        api = api.project_pages(g, vec![ids.iter().map(|id| project(*id)).collect()]);
        for id in ids {
            let blob_pages = (1..=pages)
                .map(|k| vec![blob(id, &format!("g{g}p{id}k{k}"))])
                .collect();
            api = api.blob_pages(id, blob_pages);
        }
    }
    api
}
