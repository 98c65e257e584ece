use sea_orm_migration::prelude::*;

/// 店主（租户）
#[derive(DeriveIden)]
enum ShopOwners {
    Table,
    Username,
    PasswordHash,
    ShopName,
    CreatedAt,
}

/// 会员档案
#[derive(DeriveIden)]
enum Members {
    Table,
    Id,
    Name,
    Phone,
    Birthday,
    Note,
    CreatedAt,
    OwnerUsername,
}

/// 储值账户，与会员一对一
#[derive(DeriveIden)]
enum Accounts {
    Table,
    MemberId,
    Balance,
    CurrentDiscountBp,
    UpdatedAt,
}

/// 流水（只追加）
#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    MemberId,
    Type,
    Amount,
    Detail,
    Date,
    Signature,
    OwnerUsername,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 金额统一以分（cents）存储，折扣以 basis points 存储（10000 = 原价）
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShopOwners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShopOwners::Username)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShopOwners::PasswordHash).string_len(255).not_null())
                    .col(ColumnDef::new(ShopOwners::ShopName).string_len(255).not_null())
                    .col(
                        ColumnDef::new(ShopOwners::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Members::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Members::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Members::Phone).string_len(32).not_null())
                    .col(ColumnDef::new(Members::Birthday).date().null())
                    .col(ColumnDef::new(Members::Note).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Members::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Members::OwnerUsername).string_len(64).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_members_owner")
                            .from(Members::Table, Members::OwnerUsername)
                            .to(ShopOwners::Table, ShopOwners::Username),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一店铺内手机号唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_members_owner_phone_unique")
                    .table(Members::Table)
                    .col(Members::OwnerUsername)
                    .col(Members::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::MemberId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::CurrentDiscountBp)
                            .integer()
                            .not_null()
                            .default(10000),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_accounts_member")
                            .from(Accounts::Table, Accounts::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::MemberId).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::Type).string_len(16).not_null())
                    .col(ColumnDef::new(Transactions::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::Detail).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Transactions::Date)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Transactions::Signature).text().null())
                    .col(ColumnDef::new(Transactions::OwnerUsername).string_len(64).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_member")
                            .from(Transactions::Table, Transactions::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_owner")
                            .from(Transactions::Table, Transactions::OwnerUsername)
                            .to(ShopOwners::Table, ShopOwners::Username),
                    )
                    .to_owned(),
            )
            .await?;

        // 报表按店铺 + 时间范围查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_owner_date")
                    .table(Transactions::Table)
                    .col(Transactions::OwnerUsername)
                    .col(Transactions::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_member")
                    .table(Transactions::Table)
                    .col(Transactions::MemberId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShopOwners::Table).to_owned())
            .await?;
        Ok(())
    }
}
