mod hierarchy_service;
#[cfg(test)]
mod tests;

pub use hierarchy_service::HierarchyService;
