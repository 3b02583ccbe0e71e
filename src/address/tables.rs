//! Static reference data for region resolution
//!
//! All names are stored folded: lowercase, `ё` replaced by `е`, hyphens as spaces.

/// Administrative type of a federal subject; decides which marker words
/// ("область", "край", ...) make a stem an explicit region mention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Oblast,
    Krai,
    Republic,
    AutonomousOkrug,
    AutonomousOblast,
    FederalCity,
}

impl RegionKind {
    pub fn markers(&self) -> &'static [&'static str] {
        match self {
            RegionKind::Oblast => &["обл", "область", "области", "областью"],
            RegionKind::Krai => &["край", "края", "крае", "краю", "краем"],
            RegionKind::Republic => &[
                "республика",
                "республики",
                "республике",
                "республикой",
                "респ",
            ],
            RegionKind::AutonomousOkrug => &[
                "ао",
                "автономный",
                "автономного",
                "автономном",
                "округ",
                "округа",
                "округе",
            ],
            RegionKind::AutonomousOblast => &[
                "ао",
                "автономная",
                "автономной",
                "обл",
                "область",
                "области",
            ],
            RegionKind::FederalCity => &[],
        }
    }
}

/// A federal subject: canonical name, stems (token prefixes, possibly
/// several consecutive tokens) and standalone aliases (exact tokens)
pub struct RegionDef {
    pub name: &'static str,
    pub kind: RegionKind,
    pub stems: &'static [&'static str],
    pub aliases: &'static [&'static str],
}

const fn region(
    name: &'static str,
    kind: RegionKind,
    stems: &'static [&'static str],
    aliases: &'static [&'static str],
) -> RegionDef {
    RegionDef {
        name,
        kind,
        stems,
        aliases,
    }
}

use RegionKind::*;

pub const REGIONS: &[RegionDef] = &[
    // Federal cities are resolved through the city table
    region("Москва", FederalCity, &[], &[]),
    region("Санкт-Петербург", FederalCity, &[], &["спб"]),
    region("Севастополь", FederalCity, &[], &[]),
    // Oblasts
    region("Амурская область", Oblast, &["амурск"], &[]),
    region("Архангельская область", Oblast, &["архангельск"], &[]),
    region("Астраханская область", Oblast, &["астраханск"], &[]),
    region("Белгородская область", Oblast, &["белгородск"], &[]),
    region("Брянская область", Oblast, &["брянск"], &[]),
    region("Владимирская область", Oblast, &["владимирск"], &[]),
    region("Волгоградская область", Oblast, &["волгоградск"], &[]),
    region("Вологодская область", Oblast, &["вологодск"], &[]),
    region("Воронежская область", Oblast, &["воронежск"], &[]),
    region("Ивановская область", Oblast, &["ивановск"], &[]),
    region("Иркутская область", Oblast, &["иркутск"], &[]),
    region("Калининградская область", Oblast, &["калининградск"], &[]),
    region("Калужская область", Oblast, &["калужск"], &[]),
    region("Кемеровская область", Oblast, &["кемеровск"], &["кузбасс"]),
    region("Кировская область", Oblast, &["кировск"], &[]),
    region("Костромская область", Oblast, &["костромск"], &[]),
    region("Курганская область", Oblast, &["курганск"], &[]),
    region("Курская область", Oblast, &["курск"], &[]),
    region("Ленинградская область", Oblast, &["ленинградск"], &["ло"]),
    region("Липецкая область", Oblast, &["липецк"], &[]),
    region("Магаданская область", Oblast, &["магаданск"], &[]),
    region("Московская область", Oblast, &["московск"], &["мо", "подмосковье"]),
    region("Мурманская область", Oblast, &["мурманск"], &[]),
    region("Нижегородская область", Oblast, &["нижегородск"], &[]),
    region("Новгородская область", Oblast, &["новгородск"], &[]),
    region("Новосибирская область", Oblast, &["новосибирск"], &["нсо"]),
    region("Омская область", Oblast, &["омск"], &[]),
    region("Оренбургская область", Oblast, &["оренбургск"], &[]),
    region("Орловская область", Oblast, &["орловск"], &[]),
    region("Пензенская область", Oblast, &["пензенск"], &[]),
    region("Псковская область", Oblast, &["псковск"], &[]),
    region("Ростовская область", Oblast, &["ростовск"], &[]),
    region("Рязанская область", Oblast, &["рязанск"], &[]),
    region("Самарская область", Oblast, &["самарск"], &[]),
    region("Саратовская область", Oblast, &["саратовск"], &[]),
    region("Сахалинская область", Oblast, &["сахалинск"], &[]),
    region("Свердловская область", Oblast, &["свердловск"], &[]),
    region("Смоленская область", Oblast, &["смоленск"], &[]),
    region("Тамбовская область", Oblast, &["тамбовск"], &[]),
    region("Тверская область", Oblast, &["тверск"], &[]),
    region("Томская область", Oblast, &["томск"], &[]),
    region("Тульская область", Oblast, &["тульск"], &[]),
    region("Тюменская область", Oblast, &["тюменск"], &[]),
    region("Ульяновская область", Oblast, &["ульяновск"], &[]),
    region("Челябинская область", Oblast, &["челябинск"], &[]),
    region("Ярославская область", Oblast, &["ярославск"], &[]),
    // Krais
    region("Алтайский край", Krai, &["алтайск"], &[]),
    region("Забайкальский край", Krai, &["забайкальск"], &[]),
    region("Камчатский край", Krai, &["камчатск"], &[]),
    region("Краснодарский край", Krai, &["краснодарск"], &["кубань"]),
    region("Красноярский край", Krai, &["красноярск"], &[]),
    region("Пермский край", Krai, &["пермск"], &["прикамье"]),
    region("Приморский край", Krai, &["приморск"], &["приморье"]),
    region("Ставропольский край", Krai, &["ставропольск"], &["ставрополье"]),
    region("Хабаровский край", Krai, &["хабаровск"], &[]),
    // Republics
    region("Республика Адыгея", Republic, &["адыг"], &["адыгея"]),
    region("Республика Алтай", Republic, &["алтай"], &[]),
    region("Республика Башкортостан", Republic, &["башкортостан", "башкир"], &["башкортостан", "башкирия"]),
    region("Республика Бурятия", Republic, &["бурят"], &["бурятия"]),
    region("Республика Дагестан", Republic, &["дагестан"], &["дагестан"]),
    region("Республика Ингушетия", Republic, &["ингуш"], &["ингушетия"]),
    region("Кабардино-Балкарская Республика", Republic, &["кабардино балкар"], &["кбр"]),
    region("Республика Калмыкия", Republic, &["калмык"], &["калмыкия"]),
    region("Карачаево-Черкесская Республика", Republic, &["карачаево черкес"], &["кчр"]),
    region("Республика Карелия", Republic, &["карел"], &["карелия"]),
    region("Республика Коми", Republic, &["коми"], &["коми"]),
    region("Республика Крым", Republic, &["крым"], &["крым"]),
    region("Республика Марий Эл", Republic, &["марий эл"], &["марий эл"]),
    region("Республика Мордовия", Republic, &["мордов"], &["мордовия"]),
    region("Республика Саха (Якутия)", Republic, &["саха", "якут"], &["якутия"]),
    region("Республика Северная Осетия — Алания", Republic, &["северн осет"], &["алания", "северная осетия"]),
    region("Республика Татарстан", Republic, &["татарстан"], &["татарстан"]),
    region("Республика Тыва", Republic, &["тыва", "тува"], &["тыва", "тува"]),
    region("Удмуртская Республика", Republic, &["удмурт"], &["удмуртия"]),
    region("Республика Хакасия", Republic, &["хакас"], &["хакасия"]),
    region("Чеченская Республика", Republic, &["чечен"], &["чечня"]),
    region("Чувашская Республика", Republic, &["чуваш"], &["чувашия"]),
    // Autonomous okrugs and oblast
    region("Ханты-Мансийский автономный округ — Югра", AutonomousOkrug, &["ханты мансийск"], &["хмао", "югра"]),
    region("Ямало-Ненецкий автономный округ", AutonomousOkrug, &["ямало ненецк"], &["янао"]),
    region("Ненецкий автономный округ", AutonomousOkrug, &["ненецк"], &["нао"]),
    region("Чукотский автономный округ", AutonomousOkrug, &["чукотск"], &[]),
    region("Еврейская автономная область", AutonomousOblast, &["еврейск"], &[]),
];

/// Known cities: (folded name, display name, region)
pub const CITIES: &[(&str, &str, &str)] = &[
    ("москва", "Москва", "Москва"),
    ("санкт петербург", "Санкт-Петербург", "Санкт-Петербург"),
    ("петербург", "Санкт-Петербург", "Санкт-Петербург"),
    ("севастополь", "Севастополь", "Севастополь"),
    // Московская область
    ("химки", "Химки", "Московская область"),
    ("подольск", "Подольск", "Московская область"),
    ("балашиха", "Балашиха", "Московская область"),
    ("мытищи", "Мытищи", "Московская область"),
    ("королев", "Королёв", "Московская область"),
    ("люберцы", "Люберцы", "Московская область"),
    ("красногорск", "Красногорск", "Московская область"),
    ("одинцово", "Одинцово", "Московская область"),
    ("домодедово", "Домодедово", "Московская область"),
    ("серпухов", "Серпухов", "Московская область"),
    ("коломна", "Коломна", "Московская область"),
    ("электросталь", "Электросталь", "Московская область"),
    ("щелково", "Щёлково", "Московская область"),
    ("пушкино", "Пушкино", "Московская область"),
    ("сергиев посад", "Сергиев Посад", "Московская область"),
    ("раменское", "Раменское", "Московская область"),
    ("долгопрудный", "Долгопрудный", "Московская область"),
    ("реутов", "Реутов", "Московская область"),
    ("жуковский", "Жуковский", "Московская область"),
    ("дмитров", "Дмитров", "Московская область"),
    ("ногинск", "Ногинск", "Московская область"),
    ("видное", "Видное", "Московская область"),
    // Ленинградская область
    ("гатчина", "Гатчина", "Ленинградская область"),
    ("выборг", "Выборг", "Ленинградская область"),
    ("всеволожск", "Всеволожск", "Ленинградская область"),
    ("сосновый бор", "Сосновый Бор", "Ленинградская область"),
    ("тихвин", "Тихвин", "Ленинградская область"),
    ("кириши", "Кириши", "Ленинградская область"),
    // Южный округ
    ("краснодар", "Краснодар", "Краснодарский край"),
    ("сочи", "Сочи", "Краснодарский край"),
    ("новороссийск", "Новороссийск", "Краснодарский край"),
    ("армавир", "Армавир", "Краснодарский край"),
    ("анапа", "Анапа", "Краснодарский край"),
    ("геленджик", "Геленджик", "Краснодарский край"),
    ("ейск", "Ейск", "Краснодарский край"),
    ("туапсе", "Туапсе", "Краснодарский край"),
    ("ростов на дону", "Ростов-на-Дону", "Ростовская область"),
    ("таганрог", "Таганрог", "Ростовская область"),
    ("шахты", "Шахты", "Ростовская область"),
    ("новочеркасск", "Новочеркасск", "Ростовская область"),
    ("волгодонск", "Волгодонск", "Ростовская область"),
    ("батайск", "Батайск", "Ростовская область"),
    ("волгоград", "Волгоград", "Волгоградская область"),
    ("волжский", "Волжский", "Волгоградская область"),
    ("астрахань", "Астрахань", "Астраханская область"),
    ("элиста", "Элиста", "Республика Калмыкия"),
    ("майкоп", "Майкоп", "Республика Адыгея"),
    ("симферополь", "Симферополь", "Республика Крым"),
    ("ялта", "Ялта", "Республика Крым"),
    ("евпатория", "Евпатория", "Республика Крым"),
    ("керчь", "Керчь", "Республика Крым"),
    // Северный Кавказ
    ("ставрополь", "Ставрополь", "Ставропольский край"),
    ("пятигорск", "Пятигорск", "Ставропольский край"),
    ("кисловодск", "Кисловодск", "Ставропольский край"),
    ("ессентуки", "Ессентуки", "Ставропольский край"),
    ("невинномысск", "Невинномысск", "Ставропольский край"),
    ("махачкала", "Махачкала", "Республика Дагестан"),
    ("дербент", "Дербент", "Республика Дагестан"),
    ("грозный", "Грозный", "Чеченская Республика"),
    ("владикавказ", "Владикавказ", "Республика Северная Осетия — Алания"),
    ("нальчик", "Нальчик", "Кабардино-Балкарская Республика"),
    ("черкесск", "Черкесск", "Карачаево-Черкесская Республика"),
    ("магас", "Магас", "Республика Ингушетия"),
    // Центр
    ("тула", "Тула", "Тульская область"),
    ("новомосковск", "Новомосковск", "Тульская область"),
    ("ярославль", "Ярославль", "Ярославская область"),
    ("рыбинск", "Рыбинск", "Ярославская область"),
    ("рязань", "Рязань", "Рязанская область"),
    ("липецк", "Липецк", "Липецкая область"),
    ("воронеж", "Воронеж", "Воронежская область"),
    ("белгород", "Белгород", "Белгородская область"),
    ("старый оскол", "Старый Оскол", "Белгородская область"),
    ("курск", "Курск", "Курская область"),
    ("орел", "Орёл", "Орловская область"),
    ("брянск", "Брянск", "Брянская область"),
    ("смоленск", "Смоленск", "Смоленская область"),
    ("тверь", "Тверь", "Тверская область"),
    ("калуга", "Калуга", "Калужская область"),
    ("обнинск", "Обнинск", "Калужская область"),
    ("владимир", "Владимир", "Владимирская область"),
    ("иваново", "Иваново", "Ивановская область"),
    ("кострома", "Кострома", "Костромская область"),
    ("тамбов", "Тамбов", "Тамбовская область"),
    // Северо-Запад
    ("калининград", "Калининград", "Калининградская область"),
    ("вологда", "Вологда", "Вологодская область"),
    ("череповец", "Череповец", "Вологодская область"),
    ("архангельск", "Архангельск", "Архангельская область"),
    ("северодвинск", "Северодвинск", "Архангельская область"),
    ("мурманск", "Мурманск", "Мурманская область"),
    ("петрозаводск", "Петрозаводск", "Республика Карелия"),
    ("сыктывкар", "Сыктывкар", "Республика Коми"),
    ("ухта", "Ухта", "Республика Коми"),
    ("псков", "Псков", "Псковская область"),
    ("великий новгород", "Великий Новгород", "Новгородская область"),
    ("нарьян мар", "Нарьян-Мар", "Ненецкий автономный округ"),
    // Поволжье
    ("нижний новгород", "Нижний Новгород", "Нижегородская область"),
    ("дзержинск", "Дзержинск", "Нижегородская область"),
    ("арзамас", "Арзамас", "Нижегородская область"),
    ("казань", "Казань", "Республика Татарстан"),
    ("набережные челны", "Набережные Челны", "Республика Татарстан"),
    ("нижнекамск", "Нижнекамск", "Республика Татарстан"),
    ("альметьевск", "Альметьевск", "Республика Татарстан"),
    ("самара", "Самара", "Самарская область"),
    ("тольятти", "Тольятти", "Самарская область"),
    ("сызрань", "Сызрань", "Самарская область"),
    ("уфа", "Уфа", "Республика Башкортостан"),
    ("стерлитамак", "Стерлитамак", "Республика Башкортостан"),
    ("салават", "Салават", "Республика Башкортостан"),
    ("нефтекамск", "Нефтекамск", "Республика Башкортостан"),
    ("саратов", "Саратов", "Саратовская область"),
    ("энгельс", "Энгельс", "Саратовская область"),
    ("пенза", "Пенза", "Пензенская область"),
    ("ульяновск", "Ульяновск", "Ульяновская область"),
    ("димитровград", "Димитровград", "Ульяновская область"),
    ("оренбург", "Оренбург", "Оренбургская область"),
    ("орск", "Орск", "Оренбургская область"),
    ("киров", "Киров", "Кировская область"),
    ("пермь", "Пермь", "Пермский край"),
    ("березники", "Березники", "Пермский край"),
    ("ижевск", "Ижевск", "Удмуртская Республика"),
    ("чебоксары", "Чебоксары", "Чувашская Республика"),
    ("саранск", "Саранск", "Республика Мордовия"),
    ("йошкар ола", "Йошкар-Ола", "Республика Марий Эл"),
    // Урал
    ("екатеринбург", "Екатеринбург", "Свердловская область"),
    ("нижний тагил", "Нижний Тагил", "Свердловская область"),
    ("каменск уральский", "Каменск-Уральский", "Свердловская область"),
    ("первоуральск", "Первоуральск", "Свердловская область"),
    ("челябинск", "Челябинск", "Челябинская область"),
    ("магнитогорск", "Магнитогорск", "Челябинская область"),
    ("златоуст", "Златоуст", "Челябинская область"),
    ("миасс", "Миасс", "Челябинская область"),
    ("курган", "Курган", "Курганская область"),
    ("тюмень", "Тюмень", "Тюменская область"),
    ("тобольск", "Тобольск", "Тюменская область"),
    ("сургут", "Сургут", "Ханты-Мансийский автономный округ — Югра"),
    ("нижневартовск", "Нижневартовск", "Ханты-Мансийский автономный округ — Югра"),
    ("ханты мансийск", "Ханты-Мансийск", "Ханты-Мансийский автономный округ — Югра"),
    ("новый уренгой", "Новый Уренгой", "Ямало-Ненецкий автономный округ"),
    ("ноябрьск", "Ноябрьск", "Ямало-Ненецкий автономный округ"),
    ("салехард", "Салехард", "Ямало-Ненецкий автономный округ"),
    // Сибирь
    ("новосибирск", "Новосибирск", "Новосибирская область"),
    ("бердск", "Бердск", "Новосибирская область"),
    ("омск", "Омск", "Омская область"),
    ("томск", "Томск", "Томская область"),
    ("кемерово", "Кемерово", "Кемеровская область"),
    ("новокузнецк", "Новокузнецк", "Кемеровская область"),
    ("барнаул", "Барнаул", "Алтайский край"),
    ("бийск", "Бийск", "Алтайский край"),
    ("горно алтайск", "Горно-Алтайск", "Республика Алтай"),
    ("красноярск", "Красноярск", "Красноярский край"),
    ("норильск", "Норильск", "Красноярский край"),
    ("ачинск", "Ачинск", "Красноярский край"),
    ("абакан", "Абакан", "Республика Хакасия"),
    ("кызыл", "Кызыл", "Республика Тыва"),
    ("иркутск", "Иркутск", "Иркутская область"),
    ("братск", "Братск", "Иркутская область"),
    ("ангарск", "Ангарск", "Иркутская область"),
    ("улан удэ", "Улан-Удэ", "Республика Бурятия"),
    ("чита", "Чита", "Забайкальский край"),
    // Дальний Восток
    ("якутск", "Якутск", "Республика Саха (Якутия)"),
    ("благовещенск", "Благовещенск", "Амурская область"),
    ("хабаровск", "Хабаровск", "Хабаровский край"),
    ("комсомольск на амуре", "Комсомольск-на-Амуре", "Хабаровский край"),
    ("владивосток", "Владивосток", "Приморский край"),
    ("находка", "Находка", "Приморский край"),
    ("уссурийск", "Уссурийск", "Приморский край"),
    ("биробиджан", "Биробиджан", "Еврейская автономная область"),
    ("магадан", "Магадан", "Магаданская область"),
    ("петропавловск камчатский", "Петропавловск-Камчатский", "Камчатский край"),
    ("южно сахалинск", "Южно-Сахалинск", "Сахалинская область"),
    ("анадырь", "Анадырь", "Чукотский автономный округ"),
];

/// Inclusive ranges of the first three postal code digits per region
pub const POSTAL_PREFIXES: &[(u16, u16, &str)] = &[
    (101, 129, "Москва"),
    (140, 144, "Московская область"),
    (150, 152, "Ярославская область"),
    (153, 155, "Ивановская область"),
    (156, 157, "Костромская область"),
    (160, 162, "Вологодская область"),
    (163, 165, "Архангельская область"),
    (166, 166, "Ненецкий автономный округ"),
    (167, 169, "Республика Коми"),
    (170, 172, "Тверская область"),
    (173, 175, "Новгородская область"),
    (180, 182, "Псковская область"),
    (183, 184, "Мурманская область"),
    (185, 186, "Республика Карелия"),
    (187, 188, "Ленинградская область"),
    (190, 199, "Санкт-Петербург"),
    (214, 216, "Смоленская область"),
    (236, 238, "Калининградская область"),
    (241, 243, "Брянская область"),
    (248, 249, "Калужская область"),
    (295, 298, "Республика Крым"),
    (299, 299, "Севастополь"),
    (300, 301, "Тульская область"),
    (302, 303, "Орловская область"),
    (305, 307, "Курская область"),
    (308, 309, "Белгородская область"),
    (344, 347, "Ростовская область"),
    (350, 354, "Краснодарский край"),
    (355, 357, "Ставропольский край"),
    (358, 359, "Республика Калмыкия"),
    (360, 361, "Кабардино-Балкарская Республика"),
    (362, 363, "Республика Северная Осетия — Алания"),
    (364, 366, "Чеченская Республика"),
    (367, 368, "Республика Дагестан"),
    (369, 369, "Карачаево-Черкесская Республика"),
    (385, 385, "Республика Адыгея"),
    (386, 386, "Республика Ингушетия"),
    (390, 391, "Рязанская область"),
    (392, 393, "Тамбовская область"),
    (394, 397, "Воронежская область"),
    (398, 399, "Липецкая область"),
    (400, 404, "Волгоградская область"),
    (410, 413, "Саратовская область"),
    (414, 416, "Астраханская область"),
    (420, 423, "Республика Татарстан"),
    (424, 425, "Республика Марий Эл"),
    (426, 427, "Удмуртская Республика"),
    (428, 429, "Чувашская Республика"),
    (430, 431, "Республика Мордовия"),
    (432, 433, "Ульяновская область"),
    (440, 442, "Пензенская область"),
    (443, 446, "Самарская область"),
    (450, 453, "Республика Башкортостан"),
    (454, 457, "Челябинская область"),
    (460, 462, "Оренбургская область"),
    (600, 602, "Владимирская область"),
    (603, 607, "Нижегородская область"),
    (610, 613, "Кировская область"),
    (614, 619, "Пермский край"),
    (620, 624, "Свердловская область"),
    (625, 627, "Тюменская область"),
    (628, 628, "Ханты-Мансийский автономный округ — Югра"),
    (629, 629, "Ямало-Ненецкий автономный округ"),
    (630, 633, "Новосибирская область"),
    (634, 636, "Томская область"),
    (640, 641, "Курганская область"),
    (644, 646, "Омская область"),
    (648, 648, "Красноярский край"),
    (649, 649, "Республика Алтай"),
    (650, 654, "Кемеровская область"),
    (655, 655, "Республика Хакасия"),
    (656, 659, "Алтайский край"),
    (660, 663, "Красноярский край"),
    (664, 666, "Иркутская область"),
    (667, 668, "Республика Тыва"),
    (670, 671, "Республика Бурятия"),
    (672, 674, "Забайкальский край"),
    (675, 676, "Амурская область"),
    (677, 678, "Республика Саха (Якутия)"),
    (679, 679, "Еврейская автономная область"),
    (680, 682, "Хабаровский край"),
    (683, 684, "Камчатский край"),
    (685, 686, "Магаданская область"),
    (689, 689, "Чукотский автономный округ"),
    (690, 692, "Приморский край"),
    (693, 694, "Сахалинская область"),
];

/// Tokens that precede a city name
pub const CITY_MARKERS: &[&str] = &["г", "гор", "город", "city"];

/// Street type words, in folded form. They appear before the name
/// ("ул. Ленина") or after it ("Ленинградское шоссе").
pub const STREET_MARKERS: &[&str] = &[
    "ул", "улица", "пр", "просп", "проспект", "пер", "переулок", "ш", "шоссе", "бульв",
    "бульвар", "наб", "набережная", "пл", "площадь", "мкр", "микрорайон",
];

/// Abbreviations and marker words dropped from grouping keys
pub const KEY_NOISE_TOKENS: &[&str] = &[
    "г", "гор", "город", "ул", "улица", "д", "дом", "пр", "просп", "проспект",
    "пер", "переулок", "ш", "шоссе", "бульв", "бульвар", "наб", "набережная",
    "пл", "площадь", "мкр", "микрорайон", "корп", "к", "стр", "строение", "лит",
    "литера", "россия", "рф", "российская", "федерация", "пос", "поселок", "п",
    "с", "село", "дер", "деревня", "тц", "трц", "вл", "владение",
];
