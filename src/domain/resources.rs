use std::fmt;

// Backend entity collections reachable through the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Farms,
    Plots,
    Crops,
    Varieties,
    Seasons,
    Tasks,
    Incidents,
    Documents,
    Suppliers,
    SupplyItems,
    SupplyLots,
    Warehouses,
    StockLocations,
    StockMovements,
    Farmers,
    Buyers,
    Roles,
    Reports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    // Paged list endpoint returning a page container.
    List,
    // List endpoint returning a bare array.
    ListAll,
    Get,
    Create,
    Update,
    UpdateStatus,
    Delete,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::ListAll => "list all",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::UpdateStatus => "update status",
            Operation::Delete => "delete",
        }
    }
}

impl Resource {
    pub const ALL: [Resource; 18] = [
        Resource::Farms,
        Resource::Plots,
        Resource::Crops,
        Resource::Varieties,
        Resource::Seasons,
        Resource::Tasks,
        Resource::Incidents,
        Resource::Documents,
        Resource::Suppliers,
        Resource::SupplyItems,
        Resource::SupplyLots,
        Resource::Warehouses,
        Resource::StockLocations,
        Resource::StockMovements,
        Resource::Farmers,
        Resource::Buyers,
        Resource::Roles,
        Resource::Reports,
    ];

    // Collection path relative to the API root.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Farms => "/api/v1/admin/farms",
            Resource::Plots => "/api/v1/admin/plots",
            Resource::Crops => "/api/v1/admin/crops",
            Resource::Varieties => "/api/v1/admin/varieties",
            Resource::Seasons => "/api/v1/admin/seasons",
            Resource::Tasks => "/api/v1/admin/tasks",
            Resource::Incidents => "/api/v1/admin/incidents",
            Resource::Documents => "/api/v1/admin/documents",
            Resource::Suppliers => "/api/v1/admin/suppliers",
            Resource::SupplyItems => "/api/v1/admin/suppliers/items",
            Resource::SupplyLots => "/api/v1/admin/suppliers/lots",
            Resource::Warehouses => "/api/v1/admin/warehouses",
            // Only reachable per warehouse, see `locations_path`.
            Resource::StockLocations => "/api/v1/admin/warehouses",
            Resource::StockMovements => "/api/v1/admin/warehouses/movements",
            Resource::Farmers => "/api/v1/admin/users/farmers",
            Resource::Buyers => "/api/v1/admin/users/buyers",
            Resource::Roles => "/api/v1/admin/roles",
            Resource::Reports => "/api/v1/admin/reports",
        }
    }

    // Movements are recorded through the inventory endpoint, not the listing one.
    pub fn create_path(self) -> &'static str {
        match self {
            Resource::StockMovements => "/api/v1/inventory/movements",
            other => other.path(),
        }
    }

    pub fn item_path(self, id: i64) -> String {
        format!("{}/{id}", self.path())
    }

    pub fn status_path(self, id: i64) -> String {
        format!("{}/{id}/status", self.path())
    }

    pub fn supports(self, operation: Operation) -> bool {
        use Operation::*;
        use Resource::*;

        match operation {
            List => matches!(
                self,
                Farms
                    | Plots
                    | Seasons
                    | Tasks
                    | Incidents
                    | Documents
                    | Suppliers
                    | SupplyItems
                    | SupplyLots
                    | Warehouses
                    | StockMovements
                    | Farmers
                    | Buyers
            ),
            ListAll => matches!(self, Crops | Varieties | Roles),
            Get => matches!(
                self,
                Farms
                    | Plots
                    | Seasons
                    | Tasks
                    | Incidents
                    | Documents
                    | Suppliers
                    | SupplyItems
                    | SupplyLots
                    | Warehouses
                    | Farmers
            ),
            Create => matches!(
                self,
                Crops
                    | Varieties
                    | Documents
                    | Suppliers
                    | SupplyItems
                    | SupplyLots
                    | StockMovements
                    | Farmers
                    | Roles
            ),
            Update => matches!(
                self,
                Farms | Crops | Varieties | Documents | Suppliers | SupplyItems | SupplyLots
            ),
            UpdateStatus => matches!(self, Tasks | Incidents | Farmers),
            Delete => matches!(
                self,
                Varieties | Documents | Suppliers | SupplyItems | SupplyLots | Farmers
            ),
        }
    }

    // Other collections whose listings embed data from this one and must be
    // refetched after it changes.
    pub fn dependents(self) -> &'static [Resource] {
        match self {
            Resource::Varieties => &[Resource::Crops],
            Resource::Plots => &[Resource::Farms],
            Resource::SupplyLots => &[Resource::Suppliers, Resource::SupplyItems],
            Resource::StockMovements => &[Resource::Warehouses, Resource::SupplyLots],
            Resource::Tasks | Resource::Incidents => &[Resource::Seasons],
            // User listings embed their roles.
            Resource::Roles => &[Resource::Farmers, Resource::Buyers],
            _ => &[],
        }
    }

    // Human label used in notifications.
    pub fn label(self) -> &'static str {
        match self {
            Resource::Farms => "farm",
            Resource::Plots => "plot",
            Resource::Crops => "crop",
            Resource::Varieties => "variety",
            Resource::Seasons => "season",
            Resource::Tasks => "task",
            Resource::Incidents => "incident",
            Resource::Documents => "document",
            Resource::Suppliers => "supplier",
            Resource::SupplyItems => "supply item",
            Resource::SupplyLots => "supply lot",
            Resource::Warehouses => "warehouse",
            Resource::StockLocations => "stock location",
            Resource::StockMovements => "stock movement",
            Resource::Farmers => "farmer",
            Resource::Buyers => "buyer",
            Resource::Roles => "role",
            Resource::Reports => "report",
        }
    }

    pub fn plural_label(self) -> &'static str {
        match self {
            Resource::Varieties => "varieties",
            Resource::Farms => "farms",
            Resource::Plots => "plots",
            Resource::Crops => "crops",
            Resource::Seasons => "seasons",
            Resource::Tasks => "tasks",
            Resource::Incidents => "incidents",
            Resource::Documents => "documents",
            Resource::Suppliers => "suppliers",
            Resource::SupplyItems => "supply items",
            Resource::SupplyLots => "supply lots",
            Resource::Warehouses => "warehouses",
            Resource::StockLocations => "stock locations",
            Resource::StockMovements => "stock movements",
            Resource::Farmers => "farmers",
            Resource::Buyers => "buyers",
            Resource::Roles => "roles",
            Resource::Reports => "reports",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural_label())
    }
}

// Which backend surface a client talks to. The farmer portal exposes a
// read-mostly subset of the admin collections under its own prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Portal {
    #[default]
    Admin,
    Farmer,
}

impl Portal {
    pub fn name(self) -> &'static str {
        match self {
            Portal::Admin => "admin",
            Portal::Farmer => "farmer",
        }
    }

    pub fn path(self, resource: Resource) -> &'static str {
        match (self, resource) {
            (Portal::Farmer, Resource::Suppliers) => "/api/v1/farmer/suppliers",
            (Portal::Farmer, Resource::SupplyItems) => "/api/v1/farmer/supply-items",
            (Portal::Farmer, Resource::SupplyLots) => "/api/v1/farmer/supply-lots",
            (Portal::Farmer, Resource::Warehouses | Resource::StockLocations) => {
                "/api/v1/farmer/warehouses"
            }
            (_, resource) => resource.path(),
        }
    }

    pub fn create_path(self, resource: Resource) -> &'static str {
        match self {
            Portal::Admin => resource.create_path(),
            Portal::Farmer => self.path(resource),
        }
    }

    pub fn item_path(self, resource: Resource, id: i64) -> String {
        format!("{}/{id}", self.path(resource))
    }

    pub fn status_path(self, resource: Resource, id: i64) -> String {
        format!("{}/{id}/status", self.path(resource))
    }

    pub fn supports(self, resource: Resource, operation: Operation) -> bool {
        use Operation::*;
        use Resource::*;

        match self {
            Portal::Admin => resource.supports(operation),
            Portal::Farmer => match operation {
                List => matches!(resource, Suppliers | SupplyItems | SupplyLots),
                // Farmer warehouses come back as a bare array.
                ListAll => matches!(resource, Warehouses),
                Get => matches!(resource, Warehouses),
                Create => matches!(resource, Suppliers | SupplyItems),
                Update | UpdateStatus | Delete => false,
            },
        }
    }

    pub fn locations_path(self, warehouse_id: i64) -> String {
        format!("{}/{warehouse_id}/locations", self.path(Resource::Warehouses))
    }

    pub fn warehouse_movements_path(self, warehouse_id: i64) -> String {
        format!("{}/{warehouse_id}/movements", self.path(Resource::Warehouses))
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn on_hand_path(lot_id: i64) -> String {
    format!("/api/v1/inventory/lots/{lot_id}/on-hand")
}

pub fn farmer_roles_path(farmer_id: i64) -> String {
    format!("{}/{farmer_id}/roles", Resource::Farmers.path())
}

pub fn role_path(code: &str) -> String {
    format!("{}/{code}", Resource::Roles.path())
}

pub fn plot_seasons_path(plot_id: i64) -> String {
    format!("{}/{plot_id}/seasons", Resource::Plots.path())
}

pub fn lot_movements_path(lot_id: i64) -> String {
    format!("{}/{lot_id}/movements", Resource::SupplyLots.path())
}

pub fn farm_plots_path(farm_id: i64) -> String {
    format!("{}/{farm_id}/plots", Resource::Farms.path())
}

// Server-side aggregates used by the reporting screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportKind {
    ExpensesByMonth,
    HarvestBySeason,
    IncidentsSummary,
    InventoryMovements,
    UserSummary,
    DashboardSummary,
    Yield,
    Cost,
    Revenue,
    Profit,
    TaskPerformance,
    InventoryOnHand,
    IncidentStatistics,
}

// Filters shared by the season analytics reports.
const SEASON_FILTERS: &[&str] = &["year", "fromDate", "toDate", "cropId", "farmId", "plotId"];
const YEAR_FILTER: &[&str] = &["year"];

impl ReportKind {
    pub const ALL: [ReportKind; 13] = [
        ReportKind::ExpensesByMonth,
        ReportKind::HarvestBySeason,
        ReportKind::IncidentsSummary,
        ReportKind::InventoryMovements,
        ReportKind::UserSummary,
        ReportKind::DashboardSummary,
        ReportKind::Yield,
        ReportKind::Cost,
        ReportKind::Revenue,
        ReportKind::Profit,
        ReportKind::TaskPerformance,
        ReportKind::InventoryOnHand,
        ReportKind::IncidentStatistics,
    ];

    pub fn path(self) -> &'static str {
        match self {
            ReportKind::ExpensesByMonth => "/api/v1/admin/reports/expenses-by-month",
            ReportKind::HarvestBySeason => "/api/v1/admin/reports/harvest-by-season",
            ReportKind::IncidentsSummary => "/api/v1/admin/reports/incidents-summary",
            ReportKind::InventoryMovements => "/api/v1/admin/reports/inventory-movements",
            ReportKind::UserSummary => "/api/v1/admin/reports/users/summary",
            ReportKind::DashboardSummary => "/api/v1/admin/dashboard/summary",
            ReportKind::Yield => "/api/v1/admin/reports/yield",
            ReportKind::Cost => "/api/v1/admin/reports/cost",
            ReportKind::Revenue => "/api/v1/admin/reports/revenue",
            ReportKind::Profit => "/api/v1/admin/reports/profit",
            ReportKind::TaskPerformance => "/api/v1/admin/reports/task-performance",
            ReportKind::InventoryOnHand => "/api/v1/admin/reports/inventory-onhand",
            ReportKind::IncidentStatistics => "/api/v1/admin/reports/incident-statistics",
        }
    }

    // Query parameters the endpoint understands; anything else is dropped.
    pub fn filters(self) -> &'static [&'static str] {
        match self {
            ReportKind::ExpensesByMonth
            | ReportKind::InventoryMovements
            | ReportKind::TaskPerformance
            | ReportKind::IncidentStatistics => YEAR_FILTER,
            ReportKind::Yield | ReportKind::Cost | ReportKind::Revenue | ReportKind::Profit => {
                SEASON_FILTERS
            }
            ReportKind::HarvestBySeason
            | ReportKind::IncidentsSummary
            | ReportKind::UserSummary
            | ReportKind::DashboardSummary
            | ReportKind::InventoryOnHand => &[],
        }
    }

    pub fn accepts(self, filter: &str) -> bool {
        self.filters().contains(&filter)
    }

    // Whether `result` is an array of rows rather than a single object.
    pub fn returns_rows(self) -> bool {
        matches!(
            self,
            ReportKind::ExpensesByMonth
                | ReportKind::HarvestBySeason
                | ReportKind::InventoryMovements
                | ReportKind::Yield
                | ReportKind::Cost
                | ReportKind::Revenue
                | ReportKind::Profit
                | ReportKind::InventoryOnHand
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ReportKind::ExpensesByMonth => "expenses-by-month",
            ReportKind::HarvestBySeason => "harvest-by-season",
            ReportKind::IncidentsSummary => "incidents-summary",
            ReportKind::InventoryMovements => "inventory-movements",
            ReportKind::UserSummary => "users-summary",
            ReportKind::DashboardSummary => "dashboard-summary",
            ReportKind::Yield => "yield",
            ReportKind::Cost => "cost",
            ReportKind::Revenue => "revenue",
            ReportKind::Profit => "profit",
            ReportKind::TaskPerformance => "task-performance",
            ReportKind::InventoryOnHand => "inventory-onhand",
            ReportKind::IncidentStatistics => "incident-statistics",
        }
    }
}
