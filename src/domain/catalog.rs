// Declared response shapes for every backend resource.

use crate::domain::record::{FieldValue, Record};
use crate::domain::resources::{ReportKind, Resource};
use crate::domain::schema::{Field, FieldType, Schema};
use std::sync::LazyLock;

use FieldType::{Any, Boolean, Integer, Number, String as Text};

// Field helpers matching the backend's three usual shapes.
fn req(name: &'static str, ty: FieldType) -> Field {
    Field::new(name, ty)
}

fn null(name: &'static str, ty: FieldType) -> Field {
    Field::new(name, ty).nullable()
}

fn opt(name: &'static str, ty: FieldType) -> Field {
    Field::new(name, ty).nullable().optional()
}

static ROLE: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Role")
        .field(opt("id", Integer))
        .field(opt("code", Text))
        .field(opt("name", Text))
        .field(opt("description", Text))
        .build()
});

static USER: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("AdminUser")
        .field(req("id", FieldType::OneOf(vec![Text, Integer])))
        .field(req("username", Text))
        .field(opt("email", Text))
        .field(opt("fullName", Text))
        .field(opt("phone", Text))
        .field(opt("status", Text))
        // Listings embed role objects; farmer responses carry bare role codes.
        .field(opt(
            "roles",
            FieldType::array_of(FieldType::OneOf(vec![
                Text,
                FieldType::object(Schema::clone(&ROLE)),
            ])),
        ))
        .build()
});

static FARM: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Farm")
        .field(req("id", Integer))
        .field(req("name", Text))
        .field(null("area", Number))
        .field(req("active", Boolean))
        .field(null("ownerUsername", Text))
        .field(null("provinceName", Text))
        .field(null("wardName", Text))
        .build()
});

static PLOT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Plot")
        .field(req("id", Integer))
        .field(req("plotName", Text))
        .field(opt("area", Number))
        .field(opt("soilType", Text))
        .field(opt("status", Text))
        .field(opt("farmId", Integer))
        .field(opt("farmName", Text))
        .build()
});

static CROP: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Crop")
        .field(req("id", Integer))
        .field(req("cropName", Text))
        .field(opt("description", Text))
        .build()
});

static VARIETY: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Variety")
        .field(req("id", Integer))
        .field(req("name", Text))
        .field(null("cropId", Integer))
        .field(opt("cropName", Text))
        .field(opt("description", Text))
        .build()
});

static SEASON: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Season")
        .field(req("id", Integer))
        .field(req("seasonName", Text))
        .field(null("status", Text))
        .field(opt("startDate", Text))
        .field(opt("plannedHarvestDate", Text))
        .field(opt("endDate", Text))
        .field(opt("plotId", Integer))
        .field(opt("plotName", Text))
        .field(opt("cropId", Integer))
        .field(opt("cropName", Text))
        .field(opt("varietyName", Text))
        .build()
});

static TASK: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Task")
        .field(req("id", Integer))
        .field(req("title", Text))
        .field(opt("description", Text))
        .field(opt("plannedDate", Text))
        .field(opt("dueDate", Text))
        .field(null("status", Text))
        .field(opt("notes", Text))
        .field(opt("userId", Integer))
        .field(opt("userName", Text))
        .field(opt("seasonId", Integer))
        .field(opt("seasonName", Text))
        .field(opt("farmId", Integer))
        .field(opt("farmName", Text))
        .field(opt("cropId", Integer))
        .field(opt("cropName", Text))
        .field(opt("createdAt", Text))
        .build()
});

static INCIDENT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Incident")
        .field(req("id", Integer))
        .field(opt("seasonId", Integer))
        .field(opt("seasonName", Text))
        .field(null("incidentType", Text))
        .field(null("severity", Text))
        .field(opt("description", Text))
        .field(req("status", Text))
        .field(opt("deadline", Text))
        .field(opt("assigneeId", Integer))
        .field(opt("assigneeName", Text))
        .field(opt("reportedByName", Text))
        .field(opt("resolvedAt", Text))
        .field(opt("resolutionNote", Text))
        .field(opt("cancellationReason", Text))
        .field(opt("version", Integer))
        .field(opt("createdAt", Text))
        .build()
});

static DOCUMENT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Document")
        .field(req("id", Integer))
        .field(req("title", Text))
        .field(opt("description", Text))
        .field(req("documentUrl", Text))
        .field(req("documentType", Text))
        .field(req("status", Text))
        .field(opt("createdAt", Text))
        .field(opt("updatedAt", Text))
        .field(opt("createdBy", Integer))
        .build()
});

static SUPPLIER: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Supplier")
        .field(req("id", Integer))
        .field(req("name", Text))
        .field(opt("licenseNo", Text))
        .field(opt("contactEmail", Text))
        .field(opt("contactPhone", Text))
        .build()
});

static SUPPLY_ITEM: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("SupplyItem")
        .field(req("id", Integer))
        .field(req("name", Text))
        .field(opt("activeIngredient", Text))
        .field(opt("unit", Text))
        .field(opt("category", Text))
        .field(Field::new("restrictedFlag", Boolean).default(false))
        .build()
});

static SUPPLY_LOT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("SupplyLot")
        .field(req("id", Integer))
        .field(null("supplyItemId", Integer))
        .field(opt("supplyItemName", Text))
        .field(null("supplierId", Integer))
        .field(opt("supplierName", Text))
        .field(opt("batchCode", Text))
        .field(opt("expiryDate", Text))
        .field(null("status", Text))
        .build()
});

static WAREHOUSE: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Warehouse")
        .field(req("id", Integer))
        .field(req("name", Text))
        .field(opt("type", Text))
        .field(opt("farmId", Integer))
        .field(opt("farmName", Text))
        .field(opt("provinceId", Integer))
        .field(opt("provinceName", Text))
        .field(opt("wardId", Integer))
        .field(opt("wardName", Text))
        .field(opt("locationCount", Integer))
        .build()
});

static STOCK_LOCATION: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("StockLocation")
        .field(req("id", Integer))
        .field(null("warehouseId", Integer))
        .field(null("zone", Text))
        .field(null("aisle", Text))
        .field(null("shelf", Text))
        .field(null("bin", Text))
        .build()
});

static STOCK_MOVEMENT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("StockMovement")
        .field(req("id", Integer))
        .field(null("supplyLotId", Integer))
        .field(opt("supplyItemName", Text))
        .field(null("warehouseId", Integer))
        .field(opt("warehouseName", Text))
        .field(opt("locationId", Integer))
        .field(null("movementType", Text))
        .field(null("quantity", Number))
        .field(opt("movementDate", Text))
        .field(opt("seasonId", Integer))
        .field(opt("taskId", Integer))
        .field(opt("note", Text))
        .field(Field::new("createdAt", Text).optional())
        .field(Field::new("updatedAt", Text).optional())
        .build()
});

static MONTHLY_TOTAL: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("MonthlyTotal")
        .field(req("year", Integer))
        .field(req("month", Integer))
        .field(null("total", Number))
        .build()
});

static SEASON_HARVEST: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("SeasonHarvest")
        .field(req("seasonId", Integer))
        .field(opt("seasonName", Text))
        .field(opt("cropName", Text))
        .field(null("totalQuantity", Number))
        .build()
});

static INCIDENTS_SUMMARY: LazyLock<Schema> = LazyLock::new(|| {
    let counts = || FieldType::map_of(Integer);
    Schema::builder("IncidentsSummary")
        .field(Field::new("bySeverity", counts()).default(FieldValue::Object(Record::new())))
        .field(Field::new("byStatus", counts()).default(FieldValue::Object(Record::new())))
        .field(Field::new("byIncidentType", counts()).optional())
        .field(Field::new("totalCount", Integer).default(0_i64))
        .field(opt("averageResolutionDays", Number))
        .build()
});

static MOVEMENT_SUMMARY: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("MovementSummary")
        .field(req("year", Integer))
        .field(req("month", Integer))
        .field(req("movementType", Text))
        .field(null("totalQuantity", Number))
        .build()
});

static USER_SUMMARY: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("UserSummary")
        .field(req("totalUsers", Integer))
        .field(req("activeUsers", Integer))
        .field(req("lockedUsers", Integer))
        .build()
});

static DASHBOARD_SUMMARY: LazyLock<Schema> = LazyLock::new(|| {
    let summary = Schema::builder("DashboardTotals")
        .field(req("totalUsers", Number))
        .field(req("totalFarms", Number))
        .field(req("activeSeasonsCount", Number))
        .field(req("openIncidentsCount", Number))
        .field(req("expensesThisMonth", Number))
        .field(req("harvestThisMonth", Number))
        .build();
    let latest = Schema::builder("DashboardLatest")
        .field(req("latestIncidents", FieldType::array_of(Any)))
        .field(req("latestSeasons", FieldType::array_of(Any)))
        .field(req("latestMovements", FieldType::array_of(Any)))
        .build();
    Schema::builder("DashboardSummary")
        .field(req("summary", FieldType::object(summary)))
        .field(req("latestItems", FieldType::object(latest)))
        .build()
});

static YIELD_REPORT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("YieldReport")
        .field(req("seasonId", Integer))
        .field(opt("seasonName", Text))
        .field(opt("cropName", Text))
        .field(opt("plotName", Text))
        .field(opt("farmName", Text))
        .field(null("expectedYieldKg", Number))
        .field(null("actualYieldKg", Number))
        // Absent when nothing was expected.
        .field(opt("variancePercent", Number))
        .build()
});

static COST_REPORT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("CostReport")
        .field(req("seasonId", Integer))
        .field(opt("seasonName", Text))
        .field(opt("cropName", Text))
        .field(null("totalExpense", Number))
        .field(null("totalYieldKg", Number))
        .field(opt("costPerKg", Number))
        .build()
});

static REVENUE_REPORT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("RevenueReport")
        .field(req("seasonId", Integer))
        .field(opt("seasonName", Text))
        .field(opt("cropName", Text))
        .field(null("totalQuantity", Number))
        .field(null("totalRevenue", Number))
        .field(opt("avgPricePerUnit", Number))
        .build()
});

static PROFIT_REPORT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("ProfitReport")
        .field(req("seasonId", Integer))
        .field(opt("seasonName", Text))
        .field(opt("cropName", Text))
        .field(opt("farmName", Text))
        .field(null("totalRevenue", Number))
        .field(null("totalExpense", Number))
        .field(null("grossProfit", Number))
        .field(opt("profitMargin", Number))
        .field(opt("returnOnCost", Number))
        .build()
});

static TASK_PERFORMANCE: LazyLock<Schema> = LazyLock::new(|| {
    let count = |name| Field::new(name, Integer).default(0_i64);
    Schema::builder("TaskPerformanceReport")
        .field(count("totalTasks"))
        .field(count("completedTasks"))
        .field(count("overdueTasks"))
        .field(count("pendingTasks"))
        .field(count("inProgressTasks"))
        .field(count("cancelledTasks"))
        .field(opt("completionRate", Number))
        .field(opt("overdueRate", Number))
        .build()
});

static INVENTORY_ON_HAND: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("InventoryOnHandReport")
        .field(req("warehouseId", Integer))
        .field(opt("warehouseName", Text))
        .field(opt("farmName", Text))
        .field(Field::new("totalLots", Integer).default(0_i64))
        .field(null("totalQuantityOnHand", Number))
        .field(Field::new("expiredLots", Integer).default(0_i64))
        .field(Field::new("expiringSoonLots", Integer).default(0_i64))
        .build()
});

static INCIDENT_STATISTICS: LazyLock<Schema> = LazyLock::new(|| {
    let counts = |name| {
        Field::new(name, FieldType::map_of(Integer)).default(FieldValue::Object(Record::new()))
    };
    Schema::builder("IncidentStatisticsReport")
        .field(counts("byIncidentType"))
        .field(counts("bySeverity"))
        .field(counts("byStatus"))
        .field(Field::new("totalCount", Integer).default(0_i64))
        .field(Field::new("openCount", Integer).default(0_i64))
        .field(Field::new("resolvedCount", Integer).default(0_i64))
        .field(opt("averageResolutionDays", Number))
        .build()
});

// Item schema for a resource, or `None` for resources without records.
pub fn schema_for(resource: Resource) -> Option<Schema> {
    let schema = match resource {
        Resource::Farms => &FARM,
        Resource::Plots => &PLOT,
        Resource::Crops => &CROP,
        Resource::Varieties => &VARIETY,
        Resource::Seasons => &SEASON,
        Resource::Tasks => &TASK,
        Resource::Incidents => &INCIDENT,
        Resource::Documents => &DOCUMENT,
        Resource::Suppliers => &SUPPLIER,
        Resource::SupplyItems => &SUPPLY_ITEM,
        Resource::SupplyLots => &SUPPLY_LOT,
        Resource::Warehouses => &WAREHOUSE,
        Resource::StockLocations => &STOCK_LOCATION,
        Resource::StockMovements => &STOCK_MOVEMENT,
        Resource::Farmers | Resource::Buyers => &USER,
        Resource::Roles => &ROLE,
        Resource::Reports => return None,
    };
    Some(Schema::clone(schema))
}

// Row (or whole-result) schema for a report.
pub fn report_schema(kind: ReportKind) -> Schema {
    let schema = match kind {
        ReportKind::ExpensesByMonth => &MONTHLY_TOTAL,
        ReportKind::HarvestBySeason => &SEASON_HARVEST,
        ReportKind::IncidentsSummary => &INCIDENTS_SUMMARY,
        ReportKind::InventoryMovements => &MOVEMENT_SUMMARY,
        ReportKind::UserSummary => &USER_SUMMARY,
        ReportKind::DashboardSummary => &DASHBOARD_SUMMARY,
        ReportKind::Yield => &YIELD_REPORT,
        ReportKind::Cost => &COST_REPORT,
        ReportKind::Revenue => &REVENUE_REPORT,
        ReportKind::Profit => &PROFIT_REPORT,
        ReportKind::TaskPerformance => &TASK_PERFORMANCE,
        ReportKind::InventoryOnHand => &INVENTORY_ON_HAND,
        ReportKind::IncidentStatistics => &INCIDENT_STATISTICS,
    };
    Schema::clone(schema)
}
