use serde::Serialize;
use uuid::Uuid;

use super::{Catalog, CatalogError, CatalogResult, TextQuery};
use crate::models::Department;
use crate::utils::text::non_blank;

#[derive(Debug, Clone)]
pub struct NewDepartment {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// Partial update. `parent_id: Some(None)` promotes the department to top level.
#[derive(Debug, Clone, Default)]
pub struct DepartmentChanges {
    pub name: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrgChartNode {
    pub id: Uuid,
    pub name: String,
    pub member_count: usize,
    pub children: Vec<OrgChartNode>,
}

impl Catalog {
    pub fn list_departments(&self, query: &TextQuery) -> Vec<Department> {
        self.departments.search(query)
    }

    pub fn parent_of(&self, department: &Department) -> Option<&Department> {
        department
            .parent_id
            .and_then(|parent_id| self.departments.get(parent_id))
    }

    /// `"<parent> > <name>"` when the parent resolves, otherwise just the name.
    /// Only the direct parent is consulted.
    pub fn hierarchy_label(&self, department: &Department) -> String {
        match self.parent_of(department) {
            Some(parent) => format!("{} > {}", parent.name, department.name),
            None => department.name.clone(),
        }
    }

    pub fn count_members(&self, department_id: Uuid) -> usize {
        self.users
            .iter()
            .filter(|user| user.department_id == Some(department_id))
            .count()
    }

    /// Departments nested under their parents. Departments whose parent no
    /// longer exists are listed at the top level.
    pub fn org_chart(&self) -> Vec<OrgChartNode> {
        self.departments
            .iter()
            .filter(|department| self.parent_of(department).is_none())
            .map(|root| self.org_chart_node(root))
            .collect()
    }

    fn org_chart_node(&self, department: &Department) -> OrgChartNode {
        let children = self
            .departments
            .iter()
            .filter(|child| child.parent_id == Some(department.id))
            .map(|child| self.org_chart_node(child))
            .collect();

        OrgChartNode {
            id: department.id,
            name: department.name.clone(),
            member_count: self.count_members(department.id),
            children,
        }
    }

    pub fn add_department(&mut self, new_department: NewDepartment) -> CatalogResult<Department> {
        let name = non_blank(&new_department.name)
            .ok_or_else(|| CatalogError::invalid("name must not be empty"))?;
        if let Some(parent_id) = new_department.parent_id {
            if !self.departments.contains(parent_id) {
                return Err(CatalogError::NotFound("parent department"));
            }
        }
        self.ensure_unique_sibling_name(&name, new_department.parent_id, None)?;

        let organization_id = self.organization_id;
        let department = self.departments.add(|id| Department {
            id,
            name,
            parent_id: new_department.parent_id,
            organization_id,
        });
        Ok(department.clone())
    }

    pub fn update_department(
        &mut self,
        department_id: Uuid,
        changes: DepartmentChanges,
    ) -> CatalogResult<Department> {
        let current = self
            .departments
            .get(department_id)
            .ok_or(CatalogError::NotFound("department"))?;

        let name = match changes.name.as_deref() {
            Some(raw) => {
                non_blank(raw).ok_or_else(|| CatalogError::invalid("name must not be empty"))?
            }
            None => current.name.clone(),
        };
        let parent_id = match changes.parent_id {
            Some(requested) => requested,
            None => current.parent_id,
        };

        if let Some(parent_id) = parent_id {
            if parent_id == department_id {
                return Err(CatalogError::invalid("department cannot be its own parent"));
            }
            if !self.departments.contains(parent_id) {
                return Err(CatalogError::NotFound("parent department"));
            }
            if self.descendant_ids(department_id).contains(&parent_id) {
                return Err(CatalogError::invalid(
                    "cannot move department under one of its descendants",
                ));
            }
        }
        self.ensure_unique_sibling_name(&name, parent_id, Some(department_id))?;

        self.departments
            .update(department_id, |department| {
                department.name = name;
                department.parent_id = parent_id;
            })
            .cloned()
            .ok_or(CatalogError::NotFound("department"))
    }

    /// Removes the department; its direct children move to the top level.
    pub fn remove_department(&mut self, department_id: Uuid) -> Option<Department> {
        let removed = self.departments.remove(department_id)?;
        let child_ids: Vec<Uuid> = self
            .departments
            .iter()
            .filter(|department| department.parent_id == Some(department_id))
            .map(|department| department.id)
            .collect();
        for child_id in child_ids {
            self.departments
                .update(child_id, |child| child.parent_id = None);
        }
        Some(removed)
    }

    fn descendant_ids(&self, department_id: Uuid) -> Vec<Uuid> {
        let mut ids = Vec::new();
        let mut queue = vec![department_id];

        while let Some(current) = queue.pop() {
            let child_ids: Vec<Uuid> = self
                .departments
                .iter()
                .filter(|department| department.parent_id == Some(current))
                .map(|department| department.id)
                .collect();
            queue.extend(child_ids.iter().copied());
            ids.extend(child_ids);
        }

        ids
    }

    fn ensure_unique_sibling_name(
        &self,
        name: &str,
        parent_id: Option<Uuid>,
        exclude: Option<Uuid>,
    ) -> CatalogResult<()> {
        let duplicate = self.departments.find(|department| {
            department.parent_id == parent_id
                && Some(department.id) != exclude
                && department.name == name
        });
        match duplicate {
            Some(_) => Err(CatalogError::conflict(
                "a department with the same name already exists under this parent",
            )),
            None => Ok(()),
        }
    }
}
