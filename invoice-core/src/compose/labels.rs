/// Every fixed string the composer prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub title: String,
    pub tax_number: String,
    pub commercial_register: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub invoice_number: String,
    pub issue_date: String,
    pub bill_to: String,
    pub client_phone: String,
    pub client_address: String,
    pub product: String,
    pub quantity: String,
    pub unit_price: String,
    pub discount_percent: String,
    pub tax_percent: String,
    pub tax_amount: String,
    pub total: String,
    pub subtotal: String,
    pub total_discount: String,
    pub total_tax: String,
    pub grand_total: String,
    pub notes: String,
    pub footer: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels::english()
    }
}

impl Labels {
    pub fn english() -> Self {
        Labels {
            title: "Tax Invoice".into(),
            tax_number: "Tax number".into(),
            commercial_register: "Commercial register".into(),
            address: "Address".into(),
            phone: "Phone".into(),
            website: "Website".into(),
            invoice_number: "Invoice number".into(),
            issue_date: "Issue date".into(),
            bill_to: "Bill to:".into(),
            client_phone: "Client phone".into(),
            client_address: "District".into(),
            product: "Product/Service".into(),
            quantity: "Qty".into(),
            unit_price: "Unit price".into(),
            discount_percent: "Discount %".into(),
            tax_percent: "Tax %".into(),
            tax_amount: "Tax amount".into(),
            total: "Total".into(),
            subtotal: "Subtotal:".into(),
            total_discount: "Total discount:".into(),
            total_tax: "Total tax:".into(),
            grand_total: "Grand total:".into(),
            notes: "Notes:".into(),
            footer: "Thank you for your business!".into(),
        }
    }

    /// Needs an embedded font with Arabic coverage to display.
    pub fn arabic() -> Self {
        Labels {
            title: "فاتورة ضريبية".into(),
            tax_number: "الرقم الضريبي".into(),
            commercial_register: "السجل التجاري".into(),
            address: "العنوان".into(),
            phone: "الهاتف".into(),
            website: "الموقع الإلكتروني".into(),
            invoice_number: "رقم الفاتورة".into(),
            issue_date: "تاريخ الإصدار".into(),
            bill_to: "فاتورة إلى:".into(),
            client_phone: "جوال العميل".into(),
            client_address: "الحي".into(),
            product: "المنتج/الخدمة".into(),
            quantity: "الكمية".into(),
            unit_price: "سعر الوحدة".into(),
            discount_percent: "الخصم %".into(),
            tax_percent: "الضريبة %".into(),
            tax_amount: "قيمة الضريبة".into(),
            total: "الإجمالي".into(),
            subtotal: "المجموع الفرعي:".into(),
            total_discount: "إجمالي الخصم:".into(),
            total_tax: "إجمالي الضريبة:".into(),
            grand_total: "الإجمالي النهائي:".into(),
            notes: "الملاحظات:".into(),
            footer: "شكراً لتعاملكم معنا!".into(),
        }
    }
}
